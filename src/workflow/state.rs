//! Workflow State Definitions
//!
//! State IDs are stable SMALLINT values for relational storage.

use std::fmt;

/// Behavior every workflow status enum shares.
///
/// The request store only needs to know whether a state still accepts
/// decisions and how to print it.
pub trait RequestState: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// No more transitions possible from this state
    fn is_terminal(&self) -> bool;

    /// Stable SCREAMING_SNAKE wire name
    fn as_str(&self) -> &'static str;
}

/// Transfer request states
///
/// Terminal states: CONFIRMED_EXECUTED (10), REJECTED (-10), FAILED (-20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TransferStatus {
    /// Recorded and awaiting a back-office decision
    Pending = 0,

    /// Terminal: confirmed and money moved in the same decision
    ConfirmedExecuted = 10,

    /// Terminal: declined before any money moved
    Rejected = -10,

    /// Terminal: confirmation attempted, ledger refused (e.g. funds ran
    /// out between create and confirm). No money moved.
    Failed = -20,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }

    /// Numeric state ID for relational storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Pending),
            10 => Some(TransferStatus::ConfirmedExecuted),
            -10 => Some(TransferStatus::Rejected),
            -20 => Some(TransferStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::ConfirmedExecuted => "CONFIRMED_EXECUTED",
            TransferStatus::Rejected => "REJECTED",
            TransferStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferStatus::from_id(value).ok_or(())
    }
}

impl RequestState for TransferStatus {
    fn is_terminal(&self) -> bool {
        TransferStatus::is_terminal(self)
    }

    fn as_str(&self) -> &'static str {
        TransferStatus::as_str(self)
    }
}

/// Limit-change request states
///
/// A failed approval attempt does NOT transition: the request stays
/// PENDING and the approval can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum LimitChangeStatus {
    /// Recorded and awaiting a back-office decision
    Pending = 0,

    /// Terminal: approved and the new limit applied
    Approved = 10,

    /// Terminal: declined, limit unchanged
    Rejected = -10,
}

impl LimitChangeStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LimitChangeStatus::Pending)
    }

    /// Numeric state ID for relational storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(LimitChangeStatus::Pending),
            10 => Some(LimitChangeStatus::Approved),
            -10 => Some(LimitChangeStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitChangeStatus::Pending => "PENDING",
            LimitChangeStatus::Approved => "APPROVED",
            LimitChangeStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for LimitChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for LimitChangeStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        LimitChangeStatus::from_id(value).ok_or(())
    }
}

impl RequestState for LimitChangeStatus {
    fn is_terminal(&self) -> bool {
        LimitChangeStatus::is_terminal(self)
    }

    fn as_str(&self) -> &'static str {
        LimitChangeStatus::as_str(self)
    }
}
