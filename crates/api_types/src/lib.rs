//! Wire types of the HTTP API.
//!
//! Amounts travel as decimal strings (`"1,234.56"` on the way in, `"1234.56"`
//! on the way out) and are parsed by the server, never here.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Ars,
    Usdt,
    Usdc,
    Dai,
}

/// Response body of every create endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

pub mod outcome {
    use serde::{Deserializer, Serializer, de::Error as _};

    use super::*;

    /// Failure classes a client can react to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ErrorKind {
        NotFound,
        InsufficientBalance,
        DuplicateEntity,
        Validation,
        Transient,
        Internal,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Failure {
        pub kind: ErrorKind,
        pub message: String,
        /// Request field the failure refers to, when there is one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub field: Option<String>,
    }

    /// Discriminated result of an API call.
    ///
    /// Serialized as `{"ok": true, "value": ...}` or
    /// `{"ok": false, "kind": ..., "message": ..., "field": ...}`.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Outcome<T> {
        Success(T),
        Failure(Failure),
    }

    #[derive(Serialize)]
    struct SuccessRepr<'a, T> {
        ok: bool,
        value: &'a T,
    }

    #[derive(Serialize)]
    struct FailureRepr<'a> {
        ok: bool,
        #[serde(flatten)]
        failure: &'a Failure,
    }

    #[derive(Deserialize)]
    struct Repr<T> {
        ok: bool,
        value: Option<T>,
        kind: Option<ErrorKind>,
        message: Option<String>,
        field: Option<String>,
    }

    impl<T: Serialize> Serialize for Outcome<T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Success(value) => SuccessRepr { ok: true, value }.serialize(serializer),
                Self::Failure(failure) => FailureRepr { ok: false, failure }.serialize(serializer),
            }
        }
    }

    impl<'de, T: Deserialize<'de>> Deserialize<'de> for Outcome<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Repr::<T>::deserialize(deserializer)?;
            if repr.ok {
                let value = repr.value.ok_or_else(|| D::Error::missing_field("value"))?;
                return Ok(Self::Success(value));
            }
            Ok(Self::Failure(Failure {
                kind: repr.kind.ok_or_else(|| D::Error::missing_field("kind"))?,
                message: repr.message.unwrap_or_default(),
                field: repr.field,
            }))
        }
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Bank,
        Cash,
        DigitalWallet,
        CryptoWallet,
        Broker,
    }

    /// Body of `POST /accounts` and `PATCH /accounts/{id}`.
    ///
    /// On update `currencies` is the complete wallet set of the account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        pub description: Option<String>,
        pub currencies: Vec<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub currency: Currency,
        pub balance: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        pub description: Option<String>,
        pub wallets: Vec<WalletView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DriftView {
        pub wallet_id: Uuid,
        pub currency: Currency,
        pub stored: String,
        pub computed: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Expense,
        Income,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionFields {
        pub account_id: Uuid,
        pub currency: Currency,
        pub category_id: Uuid,
        pub kind: TransactionKind,
        /// Decimal string, e.g. `"1,234.56"`.
        pub amount: String,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionEdition {
        pub id: Uuid,
        #[serde(flatten)]
        pub fields: TransactionFields,
    }

    /// Body of `POST /transactions`, tagged by `action`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "action", rename_all = "snake_case")]
    pub enum TransactionRequest {
        Creation(TransactionFields),
        Edition(TransactionEdition),
    }

    /// Query of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Option<Uuid>,
        pub currency: Option<Currency>,
        pub kind: Option<TransactionKind>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub currency: Currency,
        pub category_id: Option<Uuid>,
        pub kind: TransactionKind,
        pub amount: String,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub currency: Currency,
        pub amount: String,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub currency: Currency,
        pub amount: String,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
    }
}

pub mod exchange {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExchangeNew {
        pub account_id: Uuid,
        pub from_currency: Currency,
        pub to_currency: Currency,
        pub from_amount: String,
        pub to_amount: String,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExchangeView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub from_currency: Currency,
        pub to_currency: Currency,
        pub from_amount: String,
        pub to_amount: String,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GroupBy {
        #[default]
        Currency,
        Account,
    }

    /// Query of `GET /balances`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BalanceList {
        pub account_id: Option<Uuid>,
        pub currency: Option<Currency>,
        pub group_by: Option<GroupBy>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub account_id: Option<Uuid>,
        pub currency: Currency,
        pub amount: String,
    }
}

pub mod stats {
    use super::*;

    /// Query of `GET /stats`; `[from, to)`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatisticsQuery {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistic {
        pub currency: Currency,
        pub balance: String,
        pub total_income: String,
        pub total_expenses: String,
    }
}

pub mod credit_card {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CardTransactionKind {
        Charge,
        Refund,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditCardNew {
        pub account_id: Uuid,
        pub currency: Currency,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditCardView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub currency: Currency,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardTransactionNew {
        pub kind: CardTransactionKind,
        pub amount: String,
        /// Defaults to a single installment.
        pub installments: Option<u32>,
        pub category_id: Option<Uuid>,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardTransactionView {
        pub id: Uuid,
        pub kind: CardTransactionKind,
        pub amount: String,
        pub installments: u32,
        pub category_id: Option<Uuid>,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InstallmentView {
        pub card_transaction_id: Uuid,
        pub number: u32,
        pub amount: String,
        pub due_at: DateTime<Utc>,
    }
}
