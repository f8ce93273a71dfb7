//! Approval Policy
//!
//! Single decision point for who may create, confirm, or bypass review.
//! Workflows never inspect roles themselves; they ask the gate.

use crate::core_types::ClientId;
use crate::error::BankError;

/// Capability tier attached to a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Account holder; may act on own accounts only
    Client,
    /// Back-office; may settle pending requests
    Employee,
    /// Full control, including direct limit changes
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Employee => "EMPLOYEE",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which workflow a pending request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Transfer,
    LimitChange,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Transfer => "TRANSFER",
            RequestKind::LimitChange => "LIMIT_CHANGE",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated caller as seen by the workflows.
///
/// Construction from credentials happens in the embedding service; this
/// crate only consumes the result.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ClientId,
    roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: ClientId, roles: impl Into<Vec<Role>>) -> Self {
        Self {
            id,
            roles: roles.into(),
        }
    }

    pub fn client(id: ClientId) -> Self {
        Self::new(id, [Role::Client])
    }

    pub fn employee(id: ClientId) -> Self {
        Self::new(id, [Role::Client, Role::Employee])
    }

    pub fn admin(id: ClientId) -> Self {
        Self::new(id, [Role::Client, Role::Employee, Role::Admin])
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    fn require_any(&self, allowed: &[Role]) -> Result<(), BankError> {
        if allowed.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            Err(BankError::Forbidden)
        }
    }
}

/// The approval gate.
///
/// Both workflows route every capability check through here, so the
/// whole approval policy reads in one place.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApprovalGate;

impl ApprovalGate {
    /// Creating a request requires owning the source account
    pub fn can_create(&self, actor: &Actor, owner: ClientId) -> Result<(), BankError> {
        if actor.id == owner {
            Ok(())
        } else {
            Err(BankError::Forbidden)
        }
    }

    /// Settling a pending request (confirm, approve, or reject) requires
    /// back-office review for every kind
    pub fn can_confirm(&self, actor: &Actor, kind: RequestKind) -> Result<(), BankError> {
        match kind {
            RequestKind::Transfer | RequestKind::LimitChange => {
                actor.require_any(&[Role::Employee, Role::Admin])
            }
        }
    }

    /// Changing a credit limit without review is admin-only
    pub fn can_change_limit_direct(&self, actor: &Actor) -> Result<(), BankError> {
        actor.require_any(&[Role::Admin])
    }
}
