//! Transfers move one amount of a single currency between two accounts.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine, WalletEffect, util::model_currency,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub currency: Currency,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl Transfer {
    /// Debit on the source wallet, credit on the destination wallet.
    #[must_use]
    pub fn effects(&self) -> [WalletEffect; 2] {
        [
            WalletEffect::new(self.from_account_id, self.currency, -self.amount),
            WalletEffect::new(self.to_account_id, self.currency, self.amount),
        ]
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            from_account_id: model.from_account_id,
            to_account_id: model.to_account_id,
            currency: model_currency(&model.currency)?,
            amount: Money::new(model.amount_minor),
            occurred_at: model.occurred_at,
            description: model.description,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub currency: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    FromAccount,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ToAccount,
}

impl ActiveModelBehavior for ActiveModel {}
