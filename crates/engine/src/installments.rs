//! Persisted installment schedule rows.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, Installment, Money, ResultEngine};

impl TryFrom<Model> for Installment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            card_transaction_id: model.card_transaction_id,
            number: u32::try_from(model.number).map_err(|_| {
                EngineError::InvalidInput("invalid stored installment number".to_string())
            })?,
            amount: Money::new(model.amount_minor),
            due_at: model.due_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub card_transaction_id: Uuid,
    pub number: i32,
    pub amount_minor: i64,
    pub due_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::card_transactions::Entity",
        from = "Column::CardTransactionId",
        to = "super::card_transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    CardTransaction,
}

impl Related<super::card_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
