//! Workflow Core Types
//!
//! The generic request record shared by both workflows, plus the
//! kind-specific payloads.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;

use crate::core_types::{AccountId, ClientId, TimestampMs};
use crate::currency::CurrencyCode;
use crate::rates::RateSnapshot;

use super::state::RequestState;

/// Request ID type - ULID-based unique identifier
///
/// Minted from a single process-wide monotonic generator:
/// - Same-millisecond ids increment the random tail instead of re-rolling,
///   so a later id always sorts after an earlier one
/// - Pending queues list in creation order by sorting on id
/// - 128-bit, no machine_id to coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(ulid::Ulid);

/// The shared mint behind `RequestId::new`. One generator keeps ids
/// monotonic across workflows and threads.
fn id_mint() -> &'static Mutex<ulid::Generator> {
    static MINT: OnceLock<Mutex<ulid::Generator>> = OnceLock::new();
    MINT.get_or_init(|| Mutex::new(ulid::Generator::new()))
}

impl RequestId {
    /// Generate a new unique RequestId
    pub fn new() -> Self {
        let mut mint = id_mint()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Generation fails only when the random tail overflows inside one
        // millisecond; fall back to a fresh random id.
        let ulid = mint.generate().unwrap_or_else(|_| ulid::Ulid::new());
        Self(ulid)
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// A request moving through its workflow
///
/// `P` is the kind-specific payload, `S` the kind's status enum. The
/// record itself knows nothing about ledgers or rates; execution effects
/// live in the workflows.
#[derive(Debug, Clone)]
pub struct RequestRecord<P, S> {
    /// Unique request ID (ULID)
    pub id: RequestId,
    /// Kind-specific request data
    pub payload: P,
    /// Current workflow state
    pub status: S,
    /// Client who created the request
    pub requested_by: ClientId,
    /// Created timestamp (millis)
    pub created_at: TimestampMs,
    /// Actor who settled the request, once terminal
    pub decided_by: Option<ClientId>,
    /// Decision timestamp (millis)
    pub decided_at: Option<TimestampMs>,
    /// Last error message (for back-office triage)
    pub error: Option<String>,
}

impl<P, S: RequestState> RequestRecord<P, S> {
    /// Create a new record in the workflow's initial state
    pub fn new(payload: P, initial: S, requested_by: ClientId) -> Self {
        Self {
            id: RequestId::new(),
            payload,
            status: initial,
            requested_by,
            created_at: chrono::Utc::now().timestamp_millis(),
            decided_by: None,
            decided_at: None,
            error: None,
        }
    }

    /// Settle the request: set the status and stamp who decided, when
    pub fn decide(&mut self, status: S, decided_by: ClientId) {
        self.status = status;
        self.decided_by = Some(decided_by);
        self.decided_at = Some(chrono::Utc::now().timestamp_millis());
    }
}

impl<P: fmt::Display, S: fmt::Display> fmt::Display for RequestRecord<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request[{}] {} status={}", self.id, self.payload, self.status)
    }
}

/// Transfer request data
///
/// `converted_amount` and `rate` are quoted at creation for the approver's
/// display and overwritten with the binding values at execution time.
#[derive(Debug, Clone)]
pub struct TransferPayload {
    /// Source account (debited)
    pub sender: AccountId,
    /// Destination account (credited)
    pub receiver: AccountId,
    /// Requested amount, in the sender's currency
    pub amount: Decimal,
    /// Sender account currency
    pub currency: CurrencyCode,
    /// Receiver account currency
    pub receiver_currency: CurrencyCode,
    /// Receiver-currency amount under `rate`
    pub converted_amount: Decimal,
    /// The rate snapshot behind `converted_amount`
    pub rate: RateSnapshot,
}

impl fmt::Display for TransferPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from account {} to account {} ({} {} @ {})",
            self.amount,
            self.currency,
            self.sender,
            self.receiver,
            self.converted_amount,
            self.receiver_currency,
            self.rate.rate
        )
    }
}

/// Limit-change request data
#[derive(Debug, Clone)]
pub struct LimitChangePayload {
    pub account: AccountId,
    /// Limit at request time, for the approver's display
    pub current_limit: Decimal,
    /// Requested new limit
    pub new_limit: Decimal,
}

impl fmt::Display for LimitChangePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "account {} limit {} -> {}",
            self.account, self.current_limit, self.new_limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::TransferStatus;
    use rust_decimal_macros::dec;

    fn payload() -> TransferPayload {
        TransferPayload {
            sender: 1,
            receiver: 2,
            amount: dec!(60.00),
            currency: CurrencyCode::new("USD").unwrap(),
            receiver_currency: CurrencyCode::new("EUR").unwrap(),
            converted_amount: dec!(54.00),
            rate: RateSnapshot {
                rate: dec!(0.90),
                effective_at: 0,
                pivot: None,
            },
        }
    }

    #[test]
    fn test_request_id_string_roundtrip() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-ulid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_request_ids_mint_strictly_ascending() {
        // A tight loop lands many ids inside one millisecond; the shared
        // generator must still hand them out in ascending order.
        let ids: Vec<RequestId> = (0..10_000).map(|_| RequestId::new()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} then {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_record_new_starts_undecided() {
        let record = RequestRecord::new(payload(), TransferStatus::Pending, 1001);
        assert_eq!(record.status, TransferStatus::Pending);
        assert_eq!(record.requested_by, 1001);
        assert!(record.created_at > 0);
        assert!(record.decided_by.is_none());
        assert!(record.decided_at.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_decide_stamps_decision() {
        let mut record = RequestRecord::new(payload(), TransferStatus::Pending, 1001);
        record.decide(TransferStatus::ConfirmedExecuted, 2000);
        assert_eq!(record.status, TransferStatus::ConfirmedExecuted);
        assert_eq!(record.decided_by, Some(2000));
        assert!(record.decided_at.unwrap() >= record.created_at);
    }

    #[test]
    fn test_payload_display() {
        let text = payload().to_string();
        assert!(text.contains("60.00 USD"), "got: {text}");
        assert!(text.contains("54.00 EUR"), "got: {text}");

        let limit = LimitChangePayload {
            account: 7,
            current_limit: dec!(0),
            new_limit: dec!(500),
        };
        assert_eq!(limit.to_string(), "account 7 limit 0 -> 500");
    }
}
