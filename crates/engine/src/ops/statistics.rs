use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sea_orm::{JoinType, QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    Currency, EngineError, Money, ResultEngine, Transaction, TransactionKind, accounts,
    transactions, util::model_currency, wallets,
};

use super::{Engine, with_tx};

/// Dashboard figures for one currency.
///
/// `balance` is the current total across accounts; `income` and `expense`
/// only count transactions inside the requested period. Transfers and
/// exchanges are not counted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendSummary {
    pub currency: Currency,
    pub balance: Money,
    pub income: Money,
    pub expense: Money,
}

impl Engine {
    /// Per-currency balance plus income and expense over `[from, to)`.
    pub async fn statistics(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<SpendSummary>> {
        if let (Some(from), Some(to)) = (from, to)
            && from >= to
        {
            return Err(EngineError::InvalidInput(
                "invalid range: from must be < to".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let mut summaries: BTreeMap<Currency, SpendSummary> = BTreeMap::new();

            let wallet_models = wallets::Entity::find()
                .join(JoinType::InnerJoin, wallets::Relation::Account.def())
                .filter(accounts::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;
            for model in wallet_models {
                let currency = model_currency(&model.currency)?;
                let summary = summaries.entry(currency).or_insert_with(|| SpendSummary {
                    currency,
                    ..Default::default()
                });
                summary.balance = summary.balance.checked_add(Money::new(model.balance))?;
            }

            let mut query = transactions::Entity::find()
                .join(JoinType::InnerJoin, transactions::Relation::Account.def())
                .filter(accounts::Column::UserId.eq(user_id));
            if let Some(from) = from {
                query = query.filter(transactions::Column::OccurredAt.gte(from));
            }
            if let Some(to) = to {
                query = query.filter(transactions::Column::OccurredAt.lt(to));
            }
            for model in query.all(&db_tx).await? {
                let tx = Transaction::try_from(model)?;
                let summary = summaries.entry(tx.currency).or_insert_with(|| SpendSummary {
                    currency: tx.currency,
                    ..Default::default()
                });
                match tx.kind {
                    TransactionKind::Income => {
                        summary.income = summary.income.checked_add(tx.amount)?;
                    }
                    TransactionKind::Expense => {
                        summary.expense = summary.expense.checked_add(tx.amount)?;
                    }
                }
            }

            Ok(summaries.into_values().collect())
        })
    }
}
