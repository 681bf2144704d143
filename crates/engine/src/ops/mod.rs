use sea_orm::{ActiveValue, DatabaseConnection, prelude::*};

use crate::{EngineError, ResultEngine, users};

mod access;
mod accounts;
mod balances;
mod categories;
mod credit_cards;
mod exchanges;
mod ledger;
mod statistics;
mod transactions;
mod transfers;
mod wallets;

pub use balances::{BalanceDrift, BalanceRow};
pub use statistics::SpendSummary;

/// Attempts per operation when a wallet write loses the version race.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Run a block inside a DB transaction, committing on success and rolling back
/// on error.
///
/// The block is re-run from scratch in a fresh transaction when it fails with
/// [`EngineError::WriteConflict`], up to [`MAX_WRITE_ATTEMPTS`] times. Any
/// other error is returned as is.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let mut attempt: u32 = 1;
        loop {
            let $tx = $self.database.begin().await?;
            let result: $crate::ResultEngine<_> = async { $body }.await;
            match result {
                Ok(value) => {
                    $tx.commit().await?;
                    break Ok(value);
                }
                Err(err) => {
                    if let Err(rollback_err) = $tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "rollback failed");
                    }
                    match err {
                        $crate::EngineError::WriteConflict(reason)
                            if attempt < $crate::ops::MAX_WRITE_ATTEMPTS =>
                        {
                            tracing::debug!(attempt, %reason, "write conflict, retrying");
                            attempt += 1;
                        }
                        err => break Err(err),
                    }
                }
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Register a user id.
    ///
    /// Authentication happens outside the engine; this only creates the row
    /// every account and category hangs off.
    pub async fn new_user(&self, user_id: &str) -> ResultEngine<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::InvalidInput(
                "user id must not be empty".to_string(),
            ));
        }
        let user = users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
        };
        user.insert(&self.database)
            .await
            .map_err(|err| EngineError::from_insert(err, user_id))?;
        Ok(())
    }

    /// Whether `user_id` has been registered.
    pub async fn user_exists(&self, user_id: &str) -> ResultEngine<bool> {
        Ok(users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .is_some())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use sea_orm::{Database, TransactionTrait};

    use super::*;

    async fn engine() -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    impl Engine {
        async fn run_with_conflicts(&self, conflicts: u32, calls: &AtomicU32) -> ResultEngine<u32> {
            with_tx!(self, |_db_tx| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call <= conflicts {
                    return Err(EngineError::WriteConflict("wallet".to_string()));
                }
                Ok(call)
            })
        }

        async fn run_with_error(&self, calls: &AtomicU32) -> ResultEngine<()> {
            with_tx!(self, |_db_tx| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(EngineError::InvalidInput("bad".to_string()))
            })
        }
    }

    #[tokio::test]
    async fn write_conflicts_are_retried() {
        let engine = engine().await;
        let calls = AtomicU32::new(0);

        let result = engine.run_with_conflicts(2, &calls).await.unwrap();
        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn write_conflict_surfaces_after_last_attempt() {
        let engine = engine().await;
        let calls = AtomicU32::new(0);

        let err = engine.run_with_conflicts(10, &calls).await.unwrap_err();
        assert_eq!(err, EngineError::WriteConflict("wallet".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let engine = engine().await;
        let calls = AtomicU32::new(0);

        let err = engine.run_with_error(&calls).await.unwrap_err();
        assert_eq!(err, EngineError::InvalidInput("bad".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the connection is usable again after the rollback
        engine.database.begin().await.unwrap().commit().await.unwrap();
    }
}
