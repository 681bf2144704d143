//! Conversions between wire types and engine types.

use chrono::{DateTime, FixedOffset, Utc};
use engine::{EngineError, Money};

use crate::ServerError;

pub(crate) fn to_engine_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Ars => engine::Currency::Ars,
        api_types::Currency::Usdt => engine::Currency::Usdt,
        api_types::Currency::Usdc => engine::Currency::Usdc,
        api_types::Currency::Dai => engine::Currency::Dai,
    }
}

pub(crate) fn to_api_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Ars => api_types::Currency::Ars,
        engine::Currency::Usdt => api_types::Currency::Usdt,
        engine::Currency::Usdc => api_types::Currency::Usdc,
        engine::Currency::Dai => api_types::Currency::Dai,
    }
}

pub(crate) fn to_api_error_kind(kind: engine::ErrorKind) -> api_types::outcome::ErrorKind {
    use api_types::outcome::ErrorKind as Api;

    match kind {
        engine::ErrorKind::NotFound => Api::NotFound,
        engine::ErrorKind::InsufficientBalance => Api::InsufficientBalance,
        engine::ErrorKind::DuplicateEntity => Api::DuplicateEntity,
        engine::ErrorKind::Validation => Api::Validation,
        engine::ErrorKind::Transient => Api::Transient,
        engine::ErrorKind::Internal => Api::Internal,
    }
}

/// Parses a decimal amount coming from request field `field`.
pub(crate) fn parse_amount(field: &'static str, raw: &str) -> Result<Money, ServerError> {
    raw.parse::<Money>()
        .map_err(|error| ServerError::Field { field, error })
}

/// Same as [`parse_amount`] but rejects negative values.
pub(crate) fn parse_non_negative(field: &'static str, raw: &str) -> Result<Money, ServerError> {
    let amount = parse_amount(field, raw)?;
    if amount.is_negative() {
        return Err(ServerError::Field {
            field,
            error: EngineError::InvalidAmount("amount must be >= 0".to_string()),
        });
    }
    Ok(amount)
}

pub(crate) fn parse_positive(field: &'static str, raw: &str) -> Result<Money, ServerError> {
    let amount = parse_amount(field, raw)?;
    if !amount.is_positive() {
        return Err(ServerError::Field {
            field,
            error: EngineError::InvalidAmount("amount must be > 0".to_string()),
        });
    }
    Ok(amount)
}

pub(crate) fn utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currencies_map_both_ways() {
        for currency in engine::Currency::ALL {
            assert_eq!(to_engine_currency(to_api_currency(currency)), currency);
        }
    }

    #[test]
    fn amount_errors_carry_the_field() {
        match parse_amount("from_amount", "12.345") {
            Err(ServerError::Field { field, .. }) => assert_eq!(field, "from_amount"),
            _ => panic!("expected a field error"),
        }
        assert!(matches!(
            parse_non_negative("amount", "-1"),
            Err(ServerError::Field { field: "amount", .. })
        ));
        assert_eq!(parse_non_negative("amount", "0").unwrap(), Money::ZERO);
    }
}
