//! Money-Movement Workflows
//!
//! Implements the two-phase request/approval protocol for transfers and
//! credit limit changes.
//!
//! # Architecture
//!
//! Both workflows share one generic request abstraction: a
//! `RequestRecord<P, S>` held in a `RequestStore`, where `P` is the
//! kind-specific payload and `S` the kind's status enum. Capability
//! checks go through the single `ApprovalGate`; ledger effects go through
//! `Ledger`. The store itself knows nothing about ledgers or rates.
//!
//! # State Machines
//!
//! ```text
//! Transfer:      PENDING → CONFIRMED_EXECUTED
//!                   ↓ ↘
//!              REJECTED  FAILED
//!
//! Limit change:  PENDING → APPROVED
//!                   ↓
//!               REJECTED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Terminal-Once**: a settled request never transitions again;
//!    re-deciding it is a no-op returning the terminal status.
//! 2. **One Mutation**: at most one ledger mutation ever happens per
//!    request; concurrent decisions serialize on the record entry.
//! 3. **Binding Re-Quote**: transfer execution always re-fetches the rate;
//!    creation-time quotes are display only.
//! 4. **Lock Order**: record entry first, account locks inside. Nothing
//!    acquires a record entry while holding an account lock.

pub mod limits;
pub mod state;
pub mod store;
pub mod transfer;
pub mod types;

// Re-exports for convenience
pub use limits::{LimitChangeRecord, LimitChangeWorkflow};
pub use state::{LimitChangeStatus, RequestState, TransferStatus};
pub use store::RequestStore;
pub use transfer::{TransferRecord, TransferRequest, TransferWorkflow};
pub use types::{LimitChangePayload, RequestId, RequestRecord, TransferPayload};
