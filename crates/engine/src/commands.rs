//! Command structs for engine operations.
//!
//! Every command carries the acting `user_id` explicitly; the engine never
//! reads a caller identity from ambient state. Required fields go through
//! `new`, optional ones through chained setters.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, CardTransactionKind, Currency, Money, TransactionKind};

/// Create an account together with one zero-balance wallet per currency.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub description: Option<String>,
    pub currencies: Vec<Currency>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        currencies: Vec<Currency>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind,
            description: None,
            currencies,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Replace the editable state of an account.
///
/// `currencies` is the full wallet set after the update: missing currencies
/// get a new wallet, currencies no longer listed lose theirs.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub description: Option<String>,
    pub currencies: Vec<Currency>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        account_id: Uuid,
        name: impl Into<String>,
        kind: AccountKind,
        currencies: Vec<Currency>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            name: name.into(),
            kind,
            description: None,
            currencies,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record an income or an expense on one wallet.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub currency: Currency,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        account_id: Uuid,
        currency: Currency,
        category_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            currency,
            category_id,
            kind,
            amount,
            occurred_at,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Replace every field of an existing transaction.
#[derive(Clone, Debug)]
pub struct EditTransactionCmd {
    pub transaction_id: Uuid,
    pub values: CreateTransactionCmd,
}

impl EditTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, values: CreateTransactionCmd) -> Self {
        Self {
            transaction_id,
            values,
        }
    }
}

/// Move `amount` of `currency` between two accounts of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub currency: Currency,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        currency: Currency,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            from_account_id,
            to_account_id,
            currency,
            amount,
            occurred_at,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Convert between two currencies held by the same account.
#[derive(Clone, Debug)]
pub struct ExchangeCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: Money,
    pub to_amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl ExchangeCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        account_id: Uuid,
        from: (Currency, Money),
        to: (Currency, Money),
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            from_currency: from.0,
            to_currency: to.0,
            from_amount: from.1,
            to_amount: to.1,
            occurred_at,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewCreditCardCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub currency: Currency,
    pub name: String,
}

impl NewCreditCardCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        account_id: Uuid,
        currency: Currency,
        name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            currency,
            name: name.into(),
        }
    }
}

/// Record a charge or refund on a credit card, split into installments.
#[derive(Clone, Debug)]
pub struct CardTransactionCmd {
    pub user_id: String,
    pub credit_card_id: Uuid,
    pub category_id: Option<Uuid>,
    pub kind: CardTransactionKind,
    pub amount: Money,
    pub installments: u32,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl CardTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        credit_card_id: Uuid,
        kind: CardTransactionKind,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            credit_card_id,
            category_id: None,
            kind,
            amount,
            installments: 1,
            occurred_at,
            description: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn installments(mut self, installments: u32) -> Self {
        self.installments = installments;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BalanceGrouping {
    #[default]
    Currency,
    Account,
}

/// Filters for [`crate::Engine::balances`].
#[derive(Clone, Debug, Default)]
pub struct BalanceQuery {
    pub account_id: Option<Uuid>,
    pub currency: Option<Currency>,
    pub group_by: BalanceGrouping,
}

/// Filters for [`crate::Engine::list_transactions`].
#[derive(Clone, Debug)]
pub struct TransactionListFilter {
    pub account_id: Option<Uuid>,
    pub currency: Option<Currency>,
    pub kind: Option<TransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: u64,
}

impl Default for TransactionListFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            currency: None,
            kind: None,
            from: None,
            to: None,
            limit: 50,
        }
    }
}
