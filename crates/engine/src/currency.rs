use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency code a wallet is denominated in.
///
/// The set is closed: fiat currencies plus the stablecoins users keep in
/// crypto wallets and brokers.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units** (see
/// [`Money`](crate::Money)). Every supported currency uses 2 fraction digits,
/// so `10.50 USD` ⇄ `1050`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
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

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Ars,
        Currency::Usdt,
        Currency::Usdc,
        Currency::Dai,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Ars => "ARS",
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
            Currency::Dai => "DAI",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        2
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code() == code)
            .ok_or_else(|| EngineError::InvalidInput(format!("unsupported currency: {code}")))
    }
}
