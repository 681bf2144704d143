//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Currency, EngineError, Money, ResultEngine};

/// Trim a required display name, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let mut out = String::new();
    for token in value.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(out)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Comparison key used by uniqueness rules on user-typed names.
///
/// Accents and case are folded and punctuation runs collapse to one space, so
/// "Caja Ahorro", "caja  ahorro" and "Cajá-Ahorro" share a key. A name with
/// no letters or digits has no key and is rejected.
pub(crate) fn name_key(display: &str, label: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in display.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let key = out.trim_end();
    if key.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must contain letters or digits"
        )));
    }
    Ok(key.to_string())
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidInput(format!("invalid stored currency: {value}")))
}

pub(crate) fn require_non_negative(amount: Money, label: &str) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be >= 0"
        )));
    }
    Ok(())
}

pub(crate) fn require_positive(amount: Money, label: &str) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}
