//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

/// Account ID - globally unique identifier for a ledger account.
///
/// # Constraints:
/// - **Immutable**: Once assigned, NEVER changes
/// - **Ordered**: Two-account operations lock the lower id first,
///   so the total order over ids is load-bearing
///
/// # Usage:
/// - Primary key into the ledger arena
/// - Assigned sequentially at `open_account`
pub type AccountId = u64;

/// Client ID - owner of one or more accounts.
///
/// # Usage:
/// - Account ownership checks in the approval gate
/// - `requested_by` / `decided_by` on workflow records
///
/// Resolved by the identity layer upstream; this crate never mints one.
pub type ClientId = u64;

/// Epoch milliseconds, UTC.
pub type TimestampMs = i64;
