//! Currency codes and the currency registry
//!
//! This module provides validated currency types. Code fields are private
//! to force validation through the public API; every amount in the system
//! is denominated in a currency registered here.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for currency codes
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CurrencyCodeError {
    #[error("Currency code must be exactly 3 characters: got '{got}' ({len})")]
    InvalidLength { got: String, len: usize },

    #[error("Currency code must be uppercase A-Z: got '{0}'")]
    InvalidFormat(String),
}

impl From<CurrencyCodeError> for BankError {
    fn from(e: CurrencyCodeError) -> Self {
        let got = match e {
            CurrencyCodeError::InvalidLength { got, .. } => got,
            CurrencyCodeError::InvalidFormat(got) => got,
        };
        BankError::CurrencyNotFound(got)
    }
}

// ============================================================================
// CurrencyCode - Validated ISO-4217 Style Code (Private Field)
// ============================================================================

/// Validated currency code (guaranteed uppercase, exactly 3 ASCII letters)
///
/// Fields are private to force validation through `new()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a new validated CurrencyCode
    ///
    /// # Validation Rules
    /// - Exactly 3 characters
    /// - Uppercase A-Z only
    ///
    /// # Errors
    /// Returns `CurrencyCodeError` if validation fails
    ///
    /// # Examples
    /// ```
    /// use bankcore::currency::CurrencyCode;
    ///
    /// let usd = CurrencyCode::new("USD").unwrap();
    /// assert_eq!(usd.as_str(), "USD");
    ///
    /// let err = CurrencyCode::new("usd");
    /// assert!(err.is_err()); // lowercase rejected
    /// ```
    pub fn new(code: &str) -> Result<Self, CurrencyCodeError> {
        let code = code.trim();

        if code.len() != 3 {
            return Err(CurrencyCodeError::InvalidLength {
                got: code.to_string(),
                len: code.len(),
            });
        }

        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CurrencyCodeError::InvalidFormat(code.to_string()));
        }

        Ok(Self(code.to_string()))
    }

    /// Get the validated currency code as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

// ============================================================================
// CurrencyInfo + CurrencyRegistry
// ============================================================================

/// Currency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    /// Human-readable name ("US Dollar")
    pub name: String,
    /// Number of decimal places amounts in this currency may carry
    /// (USD = 2, JPY = 0). Conversion results are rounded to this scale.
    pub minor_units: u32,
}

impl CurrencyInfo {
    pub fn new(code: CurrencyCode, name: &str, minor_units: u32) -> Self {
        Self {
            code,
            name: name.to_string(),
            minor_units,
        }
    }
}

/// Registry of currencies known to the system
///
/// Built once at bootstrap (from config or explicit registration) and
/// shared read-only afterwards. Rates change at runtime; the currency set
/// does not.
#[derive(Debug, Default)]
pub struct CurrencyRegistry {
    currencies: FxHashMap<CurrencyCode, CurrencyInfo>,
}

impl CurrencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a currency. Re-registering a code replaces its info.
    pub fn register(&mut self, info: CurrencyInfo) {
        self.currencies.insert(info.code.clone(), info);
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<&CurrencyInfo> {
        self.currencies.get(code)
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.currencies.contains_key(code)
    }

    /// Minor units for a registered currency
    pub fn minor_units(&self, code: &CurrencyCode) -> Result<u32, BankError> {
        self.currencies
            .get(code)
            .map(|c| c.minor_units)
            .ok_or_else(|| BankError::CurrencyNotFound(code.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyInfo> {
        self.currencies.values()
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}
