//! Wallet effects.
//!
//! A [`WalletEffect`] is the signed balance change a ledger row (transaction,
//! transfer or exchange) applies to one wallet, addressed by
//! `(account_id, currency)`:
//! - positive values increase the wallet balance
//! - negative values decrease the wallet balance
//!
//! In the engine, *every* change to balances is expressed as effects, so that
//! applying, reverting and reconciling a row share one definition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEffect {
    pub account_id: Uuid,
    pub currency: Currency,
    pub delta: Money,
}

impl WalletEffect {
    #[must_use]
    pub fn new(account_id: Uuid, currency: Currency, delta: Money) -> Self {
        Self {
            account_id,
            currency,
            delta,
        }
    }

    /// The effect that undoes this one.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            delta: -self.delta,
            ..self
        }
    }

    pub(crate) fn wallet_key(&self) -> (Uuid, Currency) {
        (self.account_id, self.currency)
    }
}
