//! Currency exchanges inside a single account.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine, WalletEffect, util::model_currency,
};

/// Debits `from_amount` of `from_currency` and credits `to_amount` of
/// `to_currency` on the same account. The two amounts are independent: the
/// implied rate is whatever the user got.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub account_id: Uuid,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: Money,
    pub to_amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl Exchange {
    #[must_use]
    pub fn effects(&self) -> [WalletEffect; 2] {
        [
            WalletEffect::new(self.account_id, self.from_currency, -self.from_amount),
            WalletEffect::new(self.account_id, self.to_currency, self.to_amount),
        ]
    }
}

impl TryFrom<Model> for Exchange {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            from_currency: model_currency(&model.from_currency)?,
            to_currency: model_currency(&model.to_currency)?,
            from_amount: Money::new(model.from_amount_minor),
            to_amount: Money::new(model.to_amount_minor),
            occurred_at: model.occurred_at,
            description: model.description,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchanges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount_minor: i64,
    pub to_amount_minor: i64,
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
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
