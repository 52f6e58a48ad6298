//! The module contains the error the engine can throw.
//!
//! The errors fall in three families:
//!
//! - not found: [`KeyNotFound`] for any bank, card, category, transaction or
//!   installment group that does not exist or is not owned by the caller.
//! - validation: [`InvalidAmount`], [`InvalidDate`], [`InvalidName`],
//!   [`InvalidTransfer`], [`InvalidCursor`] and [`ExistingKey`]. These are
//!   raised before anything is written.
//! - persistence: [`Database`], propagated untouched so an outer layer can
//!   decide whether to retry (see [`EngineError::is_retryable`]).
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidTransfer`]: EngineError::InvalidTransfer
//!  [`InvalidCursor`]: EngineError::InvalidCursor
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` when the failure comes from the storage connection rather than
    /// from the request itself.
    ///
    /// Every write runs in a single database transaction, so a retried call
    /// either sees the committed result or starts from a clean state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
        )
    }

    /// `true` for the "does not exist / not yours" family.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_retryable() {
        let err = EngineError::from(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "connection reset".to_string(),
        )));
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = EngineError::InvalidAmount("amount must be > 0".to_string());
        assert!(!err.is_retryable());
        assert!(!err.is_not_found());
        assert!(EngineError::KeyNotFound("bank not exists".to_string()).is_not_found());
    }
}
