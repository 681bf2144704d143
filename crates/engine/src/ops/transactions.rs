use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EditTransactionCmd, EngineError, ResultEngine, Transaction,
    TransactionListFilter, accounts, transactions,
    util::{normalize_optional_text, require_non_negative},
};

use super::{Engine, with_tx};

/// Upper bound for `TransactionListFilter::limit`.
const MAX_LIST_LIMIT: u64 = 500;

/// `from` is inclusive and `to` is exclusive (`[from, to)`).
fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.limit == 0 || filter.limit > MAX_LIST_LIMIT {
        return Err(EngineError::InvalidInput(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(account_id) = filter.account_id {
            self = self.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(currency) = filter.currency {
            self = self.filter(transactions::Column::Currency.eq(currency.code()));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredAt.lt(to));
        }
        self
    }
}

impl Engine {
    /// Records an income or an expense and moves the wallet balance with it.
    ///
    /// The account and category must belong to the user and the account must
    /// hold a wallet in the transaction currency. An expense larger than the
    /// wallet balance fails with [`EngineError::InsufficientFunds`].
    pub async fn record_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Uuid> {
        require_non_negative(cmd.amount, "amount")?;
        let id = Uuid::new_v4();

        with_tx!(self, |db_tx| {
            let tx = self.validated_transaction(&db_tx, id, &cmd).await?;
            self.apply_effects(&db_tx, &[tx.effect()]).await?;

            let model: transactions::ActiveModel = (&tx).into();
            model.insert(&db_tx).await?;
            Ok(tx.id)
        })
    }

    /// Replaces every field of an existing transaction.
    ///
    /// The old effect is undone and the new one applied as a single net change
    /// per wallet, so editing in place is checked against the balance without
    /// the old effect. Moving the transaction to another wallet checks the
    /// undo on the old wallet and the new effect on the new one.
    pub async fn edit_transaction(&self, cmd: EditTransactionCmd) -> ResultEngine<()> {
        let values = &cmd.values;
        require_non_negative(values.amount, "amount")?;

        with_tx!(self, |db_tx| {
            let old = self
                .require_transaction(&db_tx, &values.user_id, cmd.transaction_id)
                .await?;
            let old = Transaction::try_from(old)?;
            let new = self
                .validated_transaction(&db_tx, cmd.transaction_id, values)
                .await?;

            self.apply_effects(&db_tx, &[old.effect().reversed(), new.effect()])
                .await?;

            let model: transactions::ActiveModel = (&new).into();
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes a transaction and reverses its effect.
    ///
    /// Deleting an income whose money was already spent would leave the wallet
    /// negative and fails with [`EngineError::InsufficientFunds`].
    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let tx = Transaction::try_from(model)?;
            self.apply_effects(&db_tx, &[tx.effect().reversed()])
                .await?;
            transactions::Entity::delete_by_id(transaction_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Return a transaction owned by `user_id`.
    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            Transaction::try_from(model)
        })
    }

    /// Lists transactions, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            if let Some(account_id) = filter.account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
            }
            let models = transactions::Entity::find()
                .join(JoinType::InnerJoin, transactions::Relation::Account.def())
                .filter(accounts::Column::UserId.eq(user_id))
                .apply_tx_filters(filter)
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(filter.limit)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Resolves every reference of `cmd` through the ownership guard.
    async fn validated_transaction(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        cmd: &CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        self.require_account(db, &cmd.user_id, cmd.account_id).await?;
        self.require_category(db, &cmd.user_id, cmd.category_id)
            .await?;
        self.require_wallet(db, cmd.account_id, cmd.currency).await?;
        Ok(Transaction {
            id,
            account_id: cmd.account_id,
            currency: cmd.currency,
            category_id: Some(cmd.category_id),
            kind: cmd.kind,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
            description: normalize_optional_text(cmd.description.as_deref()),
        })
    }
}

impl From<&Transaction> for transactions::ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            account_id: ActiveValue::Set(tx.account_id),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            category_id: ActiveValue::Set(tx.category_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            description: ActiveValue::Set(tx.description.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn list_filter_rejects_inverted_range_and_bad_limits() {
        let from = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let inverted = TransactionListFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        assert!(validate_list_filter(&inverted).is_err());

        let empty = TransactionListFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(validate_list_filter(&empty).is_err());

        assert!(validate_list_filter(&TransactionListFilter::default()).is_ok());
    }
}
