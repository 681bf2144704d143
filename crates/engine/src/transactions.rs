//! Transaction primitives.
//!
//! A `Transaction` is an income or an expense recorded against one wallet of
//! an account.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine, WalletEffect, util::model_currency,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }

    /// Sign applied to the amount when it hits the wallet.
    #[must_use]
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Expense => -amount,
            Self::Income => amount,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub currency: Currency,
    /// `None` once the category has been deleted.
    pub category_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl Transaction {
    #[must_use]
    pub fn effect(&self) -> WalletEffect {
        WalletEffect::new(self.account_id, self.currency, self.kind.signed(self.amount))
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            currency: model_currency(&model.currency)?,
            category_id: model.category_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            occurred_at: model.occurred_at,
            description: model.description,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub kind: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn transaction(kind: TransactionKind) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            currency: Currency::Usd,
            category_id: None,
            kind,
            amount: Money::new(500),
            occurred_at: Utc.timestamp_opt(0, 0).unwrap(),
            description: None,
        }
    }

    #[test]
    fn expense_debits_and_income_credits() {
        assert_eq!(
            transaction(TransactionKind::Expense).effect().delta,
            Money::new(-500)
        );
        assert_eq!(
            transaction(TransactionKind::Income).effect().delta,
            Money::new(500)
        );
    }

    #[test]
    fn reversed_effect_cancels_out() {
        let effect = transaction(TransactionKind::Expense).effect();
        let undo = effect.reversed();
        assert_eq!(undo.account_id, effect.account_id);
        assert_eq!(effect.delta.checked_add(undo.delta).unwrap(), Money::ZERO);
    }
}
