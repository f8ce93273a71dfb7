//! Limit-Change Workflow
//!
//! Credit limit changes flow through request -> approval, or apply
//! directly for privileged operators.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core_types::AccountId;
use crate::error::BankError;
use crate::ledger::Ledger;
use crate::policy::{Actor, ApprovalGate, RequestKind};

use super::state::LimitChangeStatus;
use super::store::RequestStore;
use super::types::{LimitChangePayload, RequestId, RequestRecord};

pub type LimitChangeRecord = RequestRecord<LimitChangePayload, LimitChangeStatus>;

/// Limit-Change Workflow - request, approve, or change directly
pub struct LimitChangeWorkflow {
    ledger: Arc<Ledger>,
    gate: ApprovalGate,
    store: RequestStore<LimitChangePayload, LimitChangeStatus>,
}

impl LimitChangeWorkflow {
    pub fn new(ledger: Arc<Ledger>, gate: ApprovalGate) -> Self {
        Self {
            ledger,
            gate,
            store: RequestStore::new(),
        }
    }

    /// Validate and record a limit-change request as PENDING.
    ///
    /// At most one open request per account: the account's pending flag is
    /// taken atomically before the record is persisted, so competing
    /// requests for the same account serialize there.
    pub fn request(
        &self,
        requester: &Actor,
        account: AccountId,
        new_limit: Decimal,
    ) -> Result<LimitChangeRecord, BankError> {
        if new_limit < Decimal::ZERO {
            return Err(BankError::InvalidLimit);
        }

        let snapshot = self.ledger.snapshot(account)?;
        self.gate.can_create(requester, snapshot.owner)?;

        self.ledger.mark_limit_change_pending(account)?;

        let record = RequestRecord::new(
            LimitChangePayload {
                account,
                current_limit: snapshot.credit_limit,
                new_limit,
            },
            LimitChangeStatus::Pending,
            requester.id,
        );
        info!(request_id = %record.id, "Limit change requested: {}", record.payload);
        self.store.insert(record.clone());

        Ok(record)
    }

    /// Approve a pending request and apply the new limit.
    ///
    /// A ledger failure leaves the request PENDING with the error recorded
    /// and surfaces the error; the approval can be retried. Re-approving a
    /// settled request is a no-op returning the terminal status.
    pub fn approve(
        &self,
        approver: &Actor,
        id: RequestId,
    ) -> Result<LimitChangeStatus, BankError> {
        self.gate.can_confirm(approver, RequestKind::LimitChange)?;

        self.store
            .with_mut(&id, |record| {
                if record.status.is_terminal() {
                    info!(request_id = %id, status = %record.status, "🔄 IDEMPOTENCY: limit change already settled");
                    return Ok(record.status);
                }

                match self
                    .ledger
                    .apply_limit_change(record.payload.account, record.payload.new_limit)
                {
                    Ok(()) => {
                        record.error = None;
                        record.decide(LimitChangeStatus::Approved, approver.id);
                        info!(request_id = %id, "Limit change approved: {}", record.payload);
                        Ok(LimitChangeStatus::Approved)
                    }
                    Err(err) => {
                        record.error = Some(err.to_string());
                        warn!(request_id = %id, error = %err, "Limit change not applied, request stays PENDING");
                        Err(err)
                    }
                }
            })
            .ok_or_else(|| BankError::RequestNotFound(id.to_string()))?
    }

    /// Decline a pending request and release the account's pending flag.
    /// Idempotent on settled requests, returning the terminal status.
    pub fn reject(&self, actor: &Actor, id: RequestId) -> Result<LimitChangeStatus, BankError> {
        self.gate.can_confirm(actor, RequestKind::LimitChange)?;

        self.store
            .with_mut(&id, |record| {
                if record.status.is_terminal() {
                    info!(request_id = %id, status = %record.status, "🔄 IDEMPOTENCY: limit change already settled");
                    return record.status;
                }
                if let Err(err) = self
                    .ledger
                    .clear_limit_change_pending(record.payload.account)
                {
                    warn!(request_id = %id, error = %err, "Pending flag not cleared on reject");
                }
                record.decide(LimitChangeStatus::Rejected, actor.id);
                info!(request_id = %id, "Limit change rejected");
                LimitChangeStatus::Rejected
            })
            .ok_or_else(|| BankError::RequestNotFound(id.to_string()))
    }

    /// Privileged unconditional change; no workflow record is created or
    /// consulted. Clears any pending flag on the account, so an open
    /// request stays approvable and applies its own value later.
    pub fn change_limit_direct(
        &self,
        actor: &Actor,
        account: AccountId,
        new_limit: Decimal,
    ) -> Result<(), BankError> {
        self.gate.can_change_limit_direct(actor)?;
        if new_limit < Decimal::ZERO {
            return Err(BankError::InvalidLimit);
        }

        self.ledger.apply_limit_change(account, new_limit)?;
        info!(account_id = account, %new_limit, changed_by = actor.id, "Credit limit changed directly");
        Ok(())
    }

    pub fn get(&self, id: RequestId) -> Option<LimitChangeRecord> {
        self.store.get(&id)
    }

    /// Undecided limit changes in creation order (the back-office queue)
    pub fn list_pending(&self) -> Vec<LimitChangeRecord> {
        self.store.pending()
    }
}
