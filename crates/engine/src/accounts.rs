//! Accounts: the owner-facing containers (a bank account, a broker, a crypto
//! wallet...) that hold one [`Wallet`] per currency.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Wallet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    Cash,
    DigitalWallet,
    CryptoWallet,
    Broker,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::DigitalWallet => "digital_wallet",
            Self::CryptoWallet => "crypto_wallet",
            Self::Broker => "broker",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "cash" => Ok(Self::Cash),
            "digital_wallet" => Ok(Self::DigitalWallet),
            "crypto_wallet" => Ok(Self::CryptoWallet),
            "broker" => Ok(Self::Broker),
            other => Err(EngineError::InvalidInput(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub description: Option<String>,
    /// Wallets ordered by balance, largest first.
    pub wallets: Vec<Wallet>,
}

impl TryFrom<(Model, Vec<Wallet>)> for Account {
    type Error = EngineError;

    fn try_from((model, wallets): (Model, Vec<Wallet>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            description: model.description,
            wallets,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::wallets::Entity")]
    Wallets,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
