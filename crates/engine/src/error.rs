//! The module contains the error the engine can throw.
//!
//! Every variant belongs to one [`ErrorKind`], the coarse taxonomy callers use
//! to decide how to present a failure:
//!
//! - [`KeyNotFound`] a referenced row is missing or owned by someone else.
//! - [`InsufficientFunds`] a mutation would drive a wallet below zero.
//! - [`ExistingKey`] a uniqueness rule was violated.
//! - [`WriteConflict`] a concurrent writer touched the same wallet; retried
//!   internally before it ever reaches a caller.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`WriteConflict`]: EngineError::WriteConflict
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Out of range: {0}")]
    OutOfRange(String),
    #[error("Still in use: {0}")]
    InUse(String),
    #[error("Write conflict: {0}")]
    WriteConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Failure classes exposed to callers.
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

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientBalance,
            Self::ExistingKey(_) => ErrorKind::DuplicateEntity,
            Self::InvalidAmount(_)
            | Self::InvalidInput(_)
            | Self::CurrencyMismatch(_)
            | Self::OutOfRange(_)
            | Self::InUse(_) => ErrorKind::Validation,
            Self::WriteConflict(_) => ErrorKind::Transient,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Maps a unique-constraint violation to [`EngineError::ExistingKey`].
    ///
    /// Pre-checks catch duplicates in the common case; this covers the insert
    /// that loses a race against a concurrent insert of the same key.
    pub(crate) fn from_insert(err: DbErr, key: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::ExistingKey(key.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::OutOfRange(a), Self::OutOfRange(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::WriteConflict(a), Self::WriteConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            EngineError::KeyNotFound("account".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::InsufficientFunds("x".into()).kind(),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(
            EngineError::ExistingKey("x".into()).kind(),
            ErrorKind::DuplicateEntity
        );
        assert_eq!(EngineError::InUse("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            EngineError::WriteConflict("x".into()).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("boom".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn non_unique_insert_errors_stay_database_errors() {
        let err = EngineError::from_insert(DbErr::Custom("boom".into()), "key");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
