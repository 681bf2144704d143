//! Credit-card charges and refunds, and how they split into installments.

use chrono::{DateTime, Months, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Upper bound on the number of installments of a single charge.
pub const MAX_INSTALLMENTS: u32 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTransactionKind {
    Charge,
    Refund,
}

impl CardTransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Refund => "refund",
        }
    }
}

impl TryFrom<&str> for CardTransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "charge" => Ok(Self::Charge),
            "refund" => Ok(Self::Refund),
            other => Err(EngineError::InvalidInput(format!(
                "invalid card transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTransaction {
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub category_id: Option<Uuid>,
    pub kind: CardTransactionKind,
    pub amount: Money,
    pub installments: u32,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl TryFrom<Model> for CardTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            credit_card_id: model.credit_card_id,
            category_id: model.category_id,
            kind: CardTransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            installments: u32::try_from(model.installments).map_err(|_| {
                EngineError::InvalidInput("invalid stored installment count".to_string())
            })?,
            occurred_at: model.occurred_at,
            description: model.description,
        })
    }
}

/// One scheduled slice of a card transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub card_transaction_id: Uuid,
    /// 1-based position in the schedule.
    pub number: u32,
    pub amount: Money,
    pub due_at: DateTime<Utc>,
}

/// Splits `amount` into `count` monthly installments starting at `first_due`.
///
/// The division remainder goes to the first installment, so the parts always
/// add up to `amount` exactly.
pub fn split_installments(
    card_transaction_id: Uuid,
    amount: Money,
    count: u32,
    first_due: DateTime<Utc>,
) -> ResultEngine<Vec<Installment>> {
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(EngineError::InvalidInput(format!(
            "installments must be between 1 and {MAX_INSTALLMENTS}"
        )));
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }

    let parts = i64::from(count);
    let base = amount.minor() / parts;
    let remainder = amount.minor() % parts;

    (0..count)
        .map(|index| {
            let due_at = first_due
                .checked_add_months(Months::new(index))
                .ok_or_else(|| EngineError::OutOfRange("installment date".to_string()))?;
            let minor = if index == 0 { base + remainder } else { base };
            Ok(Installment {
                card_transaction_id,
                number: index + 1,
                amount: Money::new(minor),
                due_at,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "card_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub category_id: Option<Uuid>,
    pub kind: String,
    pub amount_minor: i64,
    pub installments: i32,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_cards::Entity",
        from = "Column::CreditCardId",
        to = "super::credit_cards::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    CreditCard,
    #[sea_orm(has_many = "super::installments::Entity")]
    Installments,
}

impl Related<super::credit_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCard.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
