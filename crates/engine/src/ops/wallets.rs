use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, Wallet, wallets};

use super::{Engine, with_tx};

/// Largest balance first, then by currency code.
pub(super) fn sort_wallets(wallets: &mut [Wallet]) {
    wallets.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.currency.code().cmp(b.currency.code()))
    });
}

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(
        &self,
        user_id: &str,
        account_id: Uuid,
        currency: Currency,
    ) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            let model = self.require_wallet(&db_tx, account_id, currency).await?;
            Wallet::try_from(model)
        })
    }

    /// Current balance of `(account, currency)`.
    ///
    /// An account without a wallet in `currency` holds zero of it. The account
    /// itself must still belong to `user_id`.
    pub async fn balance(
        &self,
        user_id: &str,
        account_id: Uuid,
        currency: Currency,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            let balance = self
                .find_wallet(&db_tx, account_id, currency)
                .await?
                .map_or(Money::ZERO, |model| Money::new(model.balance));
            Ok(balance)
        })
    }

    /// Every wallet of an account, largest balance first.
    pub async fn list_wallets(&self, user_id: &str, account_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            self.account_wallets(&db_tx, account_id).await
        })
    }

    pub(super) async fn account_wallets(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Vec<Wallet>> {
        let models = wallets::Entity::find()
            .filter(wallets::Column::AccountId.eq(account_id))
            .order_by_asc(wallets::Column::Currency)
            .all(db)
            .await?;
        let mut out = models
            .into_iter()
            .map(Wallet::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        sort_wallets(&mut out);
        Ok(out)
    }

    pub(super) async fn find_wallet(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        currency: Currency,
    ) -> ResultEngine<Option<wallets::Model>> {
        wallets::Entity::find()
            .filter(wallets::Column::AccountId.eq(account_id))
            .filter(wallets::Column::Currency.eq(currency.code()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_wallet(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        currency: Currency,
    ) -> ResultEngine<wallets::Model> {
        self.find_wallet(db, account_id, currency)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{currency} wallet not exists")))
    }

    /// Applies `balance += delta` to one wallet.
    ///
    /// This is the only code path that writes `wallets.balance`. A result
    /// below zero fails with [`EngineError::InsufficientFunds`] before any
    /// write. The write itself is guarded by the row version read here; when
    /// another writer bumped it in between, nothing is written and the call
    /// fails with [`EngineError::WriteConflict`].
    pub(super) async fn adjust_balance(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        delta: Money,
    ) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        let current = Money::new(model.balance);
        let next = current.checked_add(delta)?;
        if next.is_negative() {
            return Err(insufficient_funds(&model.currency, current, delta));
        }

        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(next.minor()))
            .col_expr(wallets::Column::Version, Expr::value(model.version + 1))
            .filter(wallets::Column::Id.eq(wallet_id))
            .filter(wallets::Column::Version.eq(model.version))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::WriteConflict(format!(
                "wallet {wallet_id} changed concurrently"
            )));
        }

        Wallet::try_from(wallets::Model {
            balance: next.minor(),
            version: model.version + 1,
            ..model
        })
    }
}

pub(super) fn insufficient_funds(currency: &str, balance: Money, delta: Money) -> EngineError {
    EngineError::InsufficientFunds(format!(
        "{currency} balance {balance} cannot cover {}",
        -delta
    ))
}
