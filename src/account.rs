//! ENFORCED ACCOUNT TYPE - Used by the Ledger
//!
//! This is the SINGLE source of truth for one account's money state.
//! ALL balance and limit mutations MUST go through these methods.
//!
//! # Enforcement Strategy:
//! 1. Money fields are PRIVATE - no direct access
//! 2. All mutations return Result - errors are explicit
//! 3. Version auto-increments - audit trail
//! 4. checked arithmetic - overflow protection
//! 5. A failed mutation leaves the account unchanged

use rust_decimal::Decimal;
use serde::Serialize;

use crate::core_types::{AccountId, ClientId, TimestampMs};
use crate::currency::CurrencyCode;
use crate::error::BankError;

/// A single ledger account
///
/// # Invariants (ENFORCED by private fields):
/// - `balance >= -credit_limit` after every successful mutation
/// - `credit_limit >= 0`
/// - `version` increments exactly once per successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    account_id: AccountId,
    owner: ClientId,
    name: String,
    currency: CurrencyCode,
    balance: Decimal,      // PRIVATE - ONLY modified through try_debit/credit
    credit_limit: Decimal, // PRIVATE - maximum allowed overdraft, >= 0
    limit_change_pending: bool,
    version: u64, // PRIVATE - incremented on every successful mutation
    created_at: TimestampMs,
}

impl Account {
    /// Create an account, validating the opening position
    ///
    /// # Errors
    /// - `InvalidLimit` for a negative credit limit
    /// - `InsufficientFunds` if the opening balance already breaches the limit
    pub fn new(
        account_id: AccountId,
        owner: ClientId,
        name: &str,
        currency: CurrencyCode,
        opening_balance: Decimal,
        credit_limit: Decimal,
    ) -> Result<Self, BankError> {
        if credit_limit < Decimal::ZERO {
            return Err(BankError::InvalidLimit);
        }
        if opening_balance < -credit_limit {
            return Err(BankError::InsufficientFunds);
        }
        Ok(Self {
            account_id,
            owner,
            name: name.to_string(),
            currency,
            balance: opening_balance,
            credit_limit,
            limit_change_pending: false,
            version: 0,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    // ============================================================
    // READ-ONLY GETTERS (safe to expose)
    // ============================================================

    #[inline(always)]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    #[inline(always)]
    pub const fn owner(&self) -> ClientId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    #[inline(always)]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    #[inline(always)]
    pub const fn credit_limit(&self) -> Decimal {
        self.credit_limit
    }

    #[inline(always)]
    pub const fn limit_change_pending(&self) -> bool {
        self.limit_change_pending
    }

    #[inline(always)]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Spendable headroom: balance plus allowed overdraft
    #[inline]
    pub fn available(&self) -> Decimal {
        self.balance.saturating_add(self.credit_limit)
    }

    // ============================================================
    // VALIDATED MUTATIONS (ENFORCED operations)
    // ============================================================

    /// Debit `amount` if the post-debit balance stays within the limit
    ///
    /// # Errors
    /// - `InvalidAmount` for zero/negative amounts
    /// - `InsufficientFunds` if `balance - amount < -credit_limit`
    /// - `Overflow` on arithmetic failure
    ///
    /// # Effects
    /// - Decreases balance by amount; increments version
    /// - On error the account is unchanged
    pub fn try_debit(&mut self, amount: Decimal) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        let new_balance = self
            .balance
            .checked_sub(amount)
            .ok_or(BankError::Overflow)?;
        if new_balance < -self.credit_limit {
            return Err(BankError::InsufficientFunds);
        }
        self.balance = new_balance;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Credit `amount`; succeeds for any positive amount
    ///
    /// # Errors
    /// - `InvalidAmount` for zero/negative amounts
    /// - `Overflow` on arithmetic failure
    pub fn credit(&mut self, amount: Decimal) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Swap the credit limit unconditionally and settle any pending
    /// limit-change flag.
    ///
    /// The new limit binds future debits only: a balance already below
    /// `-new_limit` is left as is and simply blocks further debits.
    ///
    /// # Errors
    /// - `InvalidLimit` for a negative limit (type invariant, enforced even
    ///   though callers validate earlier)
    pub fn set_credit_limit(&mut self, new_limit: Decimal) -> Result<(), BankError> {
        if new_limit < Decimal::ZERO {
            return Err(BankError::InvalidLimit);
        }
        self.credit_limit = new_limit;
        self.limit_change_pending = false;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Flag that a limit-change request is open for this account
    ///
    /// # Errors
    /// - `LimitChangePending` if one is already open
    pub fn mark_limit_change_pending(&mut self) -> Result<(), BankError> {
        if self.limit_change_pending {
            return Err(BankError::LimitChangePending(self.account_id));
        }
        self.limit_change_pending = true;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Clear the pending flag (idempotent)
    pub fn clear_limit_change_pending(&mut self) {
        if self.limit_change_pending {
            self.limit_change_pending = false;
            self.version = self.version.wrapping_add(1);
        }
    }

    /// Replace the display name; surrounding whitespace is stripped
    ///
    /// # Errors
    /// - `InvalidName` for a blank name
    pub fn rename(&mut self, new_name: &str) -> Result<(), BankError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BankError::InvalidName);
        }
        self.name = new_name.to_string();
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// One atomic read of the display-safe fields
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account_id: self.account_id,
            owner: self.owner,
            name: self.name.clone(),
            currency: self.currency.clone(),
            balance: self.balance,
            credit_limit: self.credit_limit,
            limit_change_pending: self.limit_change_pending,
            version: self.version,
            created_at: self.created_at,
        }
    }
}

/// Owned copy of an account's display-safe state at one instant
///
/// Snapshots are for display and advisory checks ONLY. Enforcement happens
/// inside the account's own mutations, under its lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: AccountId,
    pub owner: ClientId,
    pub name: String,
    pub currency: CurrencyCode,
    pub balance: Decimal,
    pub credit_limit: Decimal,
    pub limit_change_pending: bool,
    pub version: u64,
    /// Epoch millis
    pub created_at: TimestampMs,
}

impl AccountSnapshot {
    /// Advisory: would a debit of `amount` stay within the limit, as of
    /// this snapshot? The binding check is `Account::try_debit`.
    #[inline]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        match self.balance.checked_sub(amount) {
            Some(new_balance) => new_balance >= -self.credit_limit,
            None => false,
        }
    }
}
