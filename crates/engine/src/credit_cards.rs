//! Credit cards attached to an account.
//!
//! Card spending is tracked next to the cash ledger, not inside it: charges,
//! refunds and their installments never move a wallet balance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: Uuid,
    pub account_id: Uuid,
    pub currency: Currency,
    pub name: String,
}

impl TryFrom<Model> for CreditCard {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            currency: model_currency(&model.currency)?,
            name: model.name,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub currency: String,
    pub name: String,
    pub name_norm: String,
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
    #[sea_orm(has_many = "super::card_transactions::Entity")]
    CardTransactions,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::card_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
