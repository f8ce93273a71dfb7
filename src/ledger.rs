//! Account Ledger
//!
//! Sole owner of account money state. Workflows validate and orchestrate;
//! every balance or limit mutation in the system lands here, inside the
//! owning account's lock.
//!
//! # Architecture
//!
//! The arena maps `AccountId -> Arc<Mutex<Account>>`. Handles are cloned
//! out of the map before locking, so no map shard is ever held across a
//! lock acquisition.
//!
//! # Safety Invariants
//!
//! 1. Per-account mutations are linearizable: one mutex per account.
//! 2. Two-account operations acquire BOTH locks in ascending `AccountId`
//!    order. Circular waits are impossible because every path orders the
//!    same way and single-account operations hold one lock only.
//! 3. `balance >= -credit_limit` holds after every mutation under true
//!    parallelism; the check runs inside the account lock.
//! 4. A failed operation mutates nothing (validate, then commit).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::account::{Account, AccountSnapshot};
use crate::core_types::{AccountId, ClientId};
use crate::currency::CurrencyCode;
use crate::error::BankError;

type AccountHandle = Arc<Mutex<Account>>;

/// Balances observed immediately after an executed transfer, for logging
/// and confirmation responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEffect {
    pub sender_balance: Decimal,
    pub receiver_balance: Decimal,
}

/// The account arena
pub struct Ledger {
    accounts: DashMap<AccountId, AccountHandle>,
    next_account_id: AtomicU64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_account_id: AtomicU64::new(1),
        }
    }

    /// Open an account and assign it the next id
    ///
    /// # Errors
    /// - `InvalidLimit` / `InsufficientFunds` for an invalid opening
    ///   position (see `Account::new`)
    pub fn open_account(
        &self,
        owner: ClientId,
        name: &str,
        currency: CurrencyCode,
        opening_balance: Decimal,
        credit_limit: Decimal,
    ) -> Result<AccountId, BankError> {
        let account_id = self.next_account_id.fetch_add(1, Ordering::Relaxed);
        let account = Account::new(
            account_id,
            owner,
            name,
            currency,
            opening_balance,
            credit_limit,
        )?;
        info!(account_id, owner, currency = %account.currency(), "Account opened");
        self.accounts
            .insert(account_id, Arc::new(Mutex::new(account)));
        Ok(account_id)
    }

    /// Rename an account. Only its owner may do so; the ownership check
    /// runs under the account lock.
    ///
    /// # Errors
    /// - `Forbidden` if `caller` does not own the account
    /// - `InvalidName` for a blank name
    pub fn rename_account(
        &self,
        caller: ClientId,
        id: AccountId,
        new_name: &str,
    ) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        if account.owner() != caller {
            return Err(BankError::Forbidden);
        }
        account.rename(new_name)?;
        info!(account_id = id, owner = caller, name = %account.name(), "Account renamed");
        Ok(())
    }

    /// Atomic: verify `balance - amount >= -credit_limit`, then debit.
    /// Fails with no mutation otherwise.
    pub fn reserve_and_debit(&self, id: AccountId, amount: Decimal) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        account.try_debit(amount)?;
        debug!(account_id = id, %amount, balance = %account.balance(), "Debit applied");
        Ok(())
    }

    /// Atomic add; succeeds for any existing account and positive amount
    pub fn credit(&self, id: AccountId, amount: Decimal) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        account.credit(amount)?;
        debug!(account_id = id, %amount, balance = %account.balance(), "Credit applied");
        Ok(())
    }

    /// The two-account atomic step behind transfer confirmation.
    ///
    /// Acquires both account locks in ascending id order, validates the
    /// debit invariant AND the credit's arithmetic, then applies both or
    /// neither.
    pub fn execute_transfer(
        &self,
        debit_id: AccountId,
        credit_id: AccountId,
        debit_amount: Decimal,
        credit_amount: Decimal,
    ) -> Result<TransferEffect, BankError> {
        if debit_id == credit_id {
            return Err(BankError::SameAccount);
        }
        if credit_amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }

        let debit_handle = self.handle(debit_id)?;
        let credit_handle = self.handle(credit_id)?;

        // Ascending-id lock order, regardless of money direction
        let (mut debit_account, mut credit_account) = if debit_id < credit_id {
            let d = lock(&debit_handle);
            let c = lock(&credit_handle);
            (d, c)
        } else {
            let c = lock(&credit_handle);
            let d = lock(&debit_handle);
            (d, c)
        };

        // Validate the credit side before touching the debit side, so a
        // late failure cannot leave a half-applied transfer
        credit_account
            .balance()
            .checked_add(credit_amount)
            .ok_or(BankError::Overflow)?;

        debit_account.try_debit(debit_amount)?;
        // Cannot fail: amount positivity and overflow were checked above
        // under this same lock
        credit_account.credit(credit_amount)?;

        debug!(
            debit_account = debit_id,
            credit_account = credit_id,
            %debit_amount,
            %credit_amount,
            "Transfer applied"
        );

        Ok(TransferEffect {
            sender_balance: debit_account.balance(),
            receiver_balance: credit_account.balance(),
        })
    }

    /// Unconditional credit-limit swap; clears any pending limit flag.
    /// Sanity bounds on the new limit are the requesting workflow's job.
    pub fn apply_limit_change(&self, id: AccountId, new_limit: Decimal) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        account.set_credit_limit(new_limit)?;
        debug!(account_id = id, %new_limit, "Credit limit applied");
        Ok(())
    }

    /// Atomically flag an open limit-change request.
    /// Fails `LimitChangePending` if one is already open.
    pub fn mark_limit_change_pending(&self, id: AccountId) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        account.mark_limit_change_pending()
    }

    /// Clear the pending flag (idempotent)
    pub fn clear_limit_change_pending(&self, id: AccountId) -> Result<(), BankError> {
        let handle = self.handle(id)?;
        let mut account = lock(&handle);
        account.clear_limit_change_pending();
        Ok(())
    }

    /// One atomic read for display; never used for enforcement
    pub fn snapshot(&self, id: AccountId) -> Result<AccountSnapshot, BankError> {
        let handle = self.handle(id)?;
        let account = lock(&handle);
        Ok(account.snapshot())
    }

    /// All accounts belonging to `owner`, each snapshot atomic per account
    pub fn snapshots_for_owner(&self, owner: ClientId) -> Vec<AccountSnapshot> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        handles
            .iter()
            .filter_map(|handle| {
                let account = lock(handle);
                (account.owner() == owner).then(|| account.snapshot())
            })
            .collect()
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Clone the handle out of the arena; the map shard is released before
    /// the caller locks
    fn handle(&self, id: AccountId) -> Result<AccountHandle, BankError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(BankError::AccountNotFound(id))
    }
}

/// Accounts are consistent at rest (validate-then-commit mutations), so a
/// poisoned lock is recoverable
fn lock(handle: &AccountHandle) -> MutexGuard<'_, Account> {
    handle
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
