//! bankcore - Money-Movement Core for a Banking Backend
//!
//! Accounts, credit limits, currency conversion, and two-phase transfer
//! and limit-change workflows behind a single approval gate.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, ClientId, etc.)
//! - [`error`] - Crate-wide error taxonomy
//! - [`currency`] - Validated currency codes and the registry
//! - [`money`] - Amount scale validation and minor-unit rounding
//! - [`rates`] - Concurrent exchange rate table
//! - [`account`] - Enforced account type
//! - [`ledger`] - Account arena with linearizable mutations
//! - [`policy`] - Actors, roles, and the approval gate
//! - [`workflow`] - Transfer and limit-change request workflows
//! - [`config`] - YAML application config
//! - [`logging`] - File + stdout tracing setup

// Core types - must be first!
pub mod core_types;

pub mod error;

// Currency and conversion
pub mod currency;
pub mod money;
pub mod rates;

// Money state
pub mod account;
pub mod ledger;

// Policy and workflows
pub mod policy;
pub mod workflow;

// Application plumbing
pub mod config;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Account, AccountSnapshot};
pub use config::{AppConfig, BankConfig};
pub use core_types::{AccountId, ClientId, TimestampMs};
pub use currency::{CurrencyCode, CurrencyInfo, CurrencyRegistry};
pub use error::BankError;
pub use ledger::{Ledger, TransferEffect};
pub use policy::{Actor, ApprovalGate, RequestKind, Role};
pub use rates::{ExchangeRate, RateSnapshot, RateTable};

// Workflow re-exports
pub use workflow::{
    LimitChangeRecord, LimitChangeStatus, LimitChangeWorkflow, RequestId, RequestRecord,
    RequestState, RequestStore, TransferRecord, TransferRequest, TransferStatus, TransferWorkflow,
};
