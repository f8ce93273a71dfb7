//! Error Types
//!
//! One crate-wide taxonomy. The transport layer embedding this crate maps
//! `code()` strings to its own representation; nothing here is
//! transport-specific.
//!
//! Already-terminal workflow decisions are NOT errors: re-confirming a
//! settled request returns the existing terminal status as `Ok`.

use thiserror::Error;

use crate::core_types::AccountId;

/// Money-movement error taxonomy
///
/// Error codes are stable and intended for API response mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    // === Not Found ===
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount precision exceeds {currency} minor units ({max})")]
    AmountPrecision { currency: String, max: u32 },

    #[error("Credit limit must not be negative")]
    InvalidLimit,

    #[error("Account name must not be blank")]
    InvalidName,

    #[error("Sender and receiver account cannot be the same")]
    SameAccount,

    #[error("No conversion path from {from} to {to}")]
    NoConversionPath { from: String, to: String },

    #[error("Exchange rate must be greater than zero")]
    InvalidRate,

    #[error("A limit change is already pending for account {0}")]
    LimitChangePending(AccountId),

    // === Ledger Errors ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Balance arithmetic would overflow")]
    Overflow,

    // === Policy Errors ===
    #[error("Actor lacks the required capability")]
    Forbidden,

    // === Retryable Errors ===
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl BankError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            BankError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            BankError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            BankError::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            BankError::InvalidAmount => "INVALID_AMOUNT",
            BankError::AmountPrecision { .. } => "AMOUNT_PRECISION",
            BankError::InvalidLimit => "INVALID_LIMIT",
            BankError::InvalidName => "INVALID_NAME",
            BankError::SameAccount => "SAME_ACCOUNT",
            BankError::NoConversionPath { .. } => "NO_CONVERSION_PATH",
            BankError::InvalidRate => "INVALID_RATE",
            BankError::LimitChangePending(_) => "LIMIT_CHANGE_PENDING",
            BankError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            BankError::Overflow => "OVERFLOW",
            BankError::Forbidden => "FORBIDDEN",
            BankError::Transient(_) => "TRANSIENT",
        }
    }

    /// Safe to retry without operator intervention?
    ///
    /// Only `Transient` qualifies: the failed call had no effect and the
    /// underlying condition (e.g. a stale rate quote) clears on its own.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, BankError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BankError::SameAccount.code(), "SAME_ACCOUNT");
        assert_eq!(BankError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(BankError::Forbidden.code(), "FORBIDDEN");
        assert_eq!(BankError::InvalidName.code(), "INVALID_NAME");
        assert_eq!(BankError::AccountNotFound(7).code(), "ACCOUNT_NOT_FOUND");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BankError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
        assert_eq!(
            BankError::AccountNotFound(42).to_string(),
            "Account not found: 42"
        );
        assert_eq!(
            BankError::NoConversionPath {
                from: "USD".to_string(),
                to: "XAU".to_string()
            }
            .to_string(),
            "No conversion path from USD to XAU"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(BankError::Transient("rate quote stale".to_string()).is_transient());
        assert!(!BankError::InsufficientFunds.is_transient());
        assert!(!BankError::Forbidden.is_transient());
    }
}
