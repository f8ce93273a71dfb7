//! Transfer Workflow
//!
//! Drives transfer requests from creation through back-office
//! confirmation to the atomic ledger step.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core_types::AccountId;
use crate::error::BankError;
use crate::ledger::Ledger;
use crate::money::validate_scale;
use crate::policy::{Actor, ApprovalGate, RequestKind};
use crate::rates::RateTable;

use super::state::TransferStatus;
use super::store::RequestStore;
use super::types::{RequestId, RequestRecord, TransferPayload};

/// Transfer parameters from the caller
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender: AccountId,
    pub receiver: AccountId,
    /// Amount in the sender account's currency
    pub amount: Decimal,
}

pub type TransferRecord = RequestRecord<TransferPayload, TransferStatus>;

/// Transfer Workflow - create, confirm, execute
pub struct TransferWorkflow {
    ledger: Arc<Ledger>,
    rates: Arc<RateTable>,
    gate: ApprovalGate,
    store: RequestStore<TransferPayload, TransferStatus>,
}

impl TransferWorkflow {
    pub fn new(ledger: Arc<Ledger>, rates: Arc<RateTable>, gate: ApprovalGate) -> Self {
        Self {
            ledger,
            rates,
            gate,
            store: RequestStore::new(),
        }
    }

    /// Validate and record a transfer request as PENDING.
    ///
    /// The funds check and the conversion quote are advisory here: they
    /// fail obviously-bad requests early and give the approver amounts to
    /// look at, but the binding checks run again at execution time.
    pub fn create(
        &self,
        requester: &Actor,
        req: TransferRequest,
    ) -> Result<TransferRecord, BankError> {
        if req.amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        if req.sender == req.receiver {
            return Err(BankError::SameAccount);
        }

        let sender = self.ledger.snapshot(req.sender)?;
        let receiver = self.ledger.snapshot(req.receiver)?;

        let sender_info = self
            .rates
            .registry()
            .get(&sender.currency)
            .ok_or_else(|| BankError::CurrencyNotFound(sender.currency.to_string()))?;
        validate_scale(req.amount, sender_info)?;

        self.gate.can_create(requester, sender.owner)?;

        // Fails creation early if no conversion path exists right now
        let (converted_amount, rate) =
            self.rates
                .convert(req.amount, &sender.currency, &receiver.currency)?;

        // Advisory: funds can still change before confirmation
        if !sender.can_cover(req.amount) {
            return Err(BankError::InsufficientFunds);
        }

        let record = RequestRecord::new(
            TransferPayload {
                sender: req.sender,
                receiver: req.receiver,
                amount: req.amount,
                currency: sender.currency.clone(),
                receiver_currency: receiver.currency.clone(),
                converted_amount,
                rate,
            },
            TransferStatus::Pending,
            requester.id,
        );

        info!(
            request_id = %record.id,
            amount = %req.amount,
            converted = %converted_amount,
            "Transfer requested: {} -> {}", req.sender, req.receiver
        );
        self.store.insert(record.clone());

        Ok(record)
    }

    /// Confirm a pending transfer and run the atomic ledger step.
    ///
    /// The conversion is re-quoted here and the fresh quote is binding;
    /// the creation-time quote is never trusted. A rate failure leaves the
    /// request PENDING (nothing was attempted against the ledger, retry is
    /// safe). A ledger refusal settles the request as FAILED and surfaces
    /// the ledger error.
    ///
    /// Re-confirming a settled request is a no-op returning the terminal
    /// status. Concurrent confirmations of the same request serialize on
    /// the record entry, so exactly one ledger mutation ever happens.
    pub fn confirm_and_execute(
        &self,
        confirmer: &Actor,
        id: RequestId,
    ) -> Result<TransferStatus, BankError> {
        self.gate.can_confirm(confirmer, RequestKind::Transfer)?;

        self.store
            .with_mut(&id, |record| {
                if record.status.is_terminal() {
                    info!(request_id = %id, status = %record.status, "🔄 IDEMPOTENCY: transfer already settled");
                    return Ok(record.status);
                }

                let (converted_amount, rate) = match self.rates.convert(
                    record.payload.amount,
                    &record.payload.currency,
                    &record.payload.receiver_currency,
                ) {
                    Ok(quote) => quote,
                    Err(err) => {
                        warn!(request_id = %id, error = %err, "Rate unavailable at confirmation, request stays PENDING");
                        record.error = Some(err.to_string());
                        return Err(err);
                    }
                };

                match self.ledger.execute_transfer(
                    record.payload.sender,
                    record.payload.receiver,
                    record.payload.amount,
                    converted_amount,
                ) {
                    Ok(effect) => {
                        // Binding values overwrite the creation-time quote
                        record.payload.converted_amount = converted_amount;
                        record.payload.rate = rate;
                        record.error = None;
                        record.decide(TransferStatus::ConfirmedExecuted, confirmer.id);
                        info!(
                            request_id = %id,
                            sender_balance = %effect.sender_balance,
                            receiver_balance = %effect.receiver_balance,
                            "Transfer executed: {}", record.payload
                        );
                        Ok(TransferStatus::ConfirmedExecuted)
                    }
                    Err(err) => {
                        record.error = Some(err.to_string());
                        record.decide(TransferStatus::Failed, confirmer.id);
                        warn!(request_id = %id, error = %err, "Transfer failed at execution");
                        Err(err)
                    }
                }
            })
            .ok_or_else(|| BankError::RequestNotFound(id.to_string()))?
    }

    /// Decline a pending transfer. No ledger effect.
    /// Idempotent on settled requests, returning the terminal status.
    pub fn reject(&self, actor: &Actor, id: RequestId) -> Result<TransferStatus, BankError> {
        self.gate.can_confirm(actor, RequestKind::Transfer)?;

        self.store
            .with_mut(&id, |record| {
                if record.status.is_terminal() {
                    info!(request_id = %id, status = %record.status, "🔄 IDEMPOTENCY: transfer already settled");
                    return record.status;
                }
                record.decide(TransferStatus::Rejected, actor.id);
                info!(request_id = %id, "Transfer rejected");
                TransferStatus::Rejected
            })
            .ok_or_else(|| BankError::RequestNotFound(id.to_string()))
    }

    pub fn get(&self, id: RequestId) -> Option<TransferRecord> {
        self.store.get(&id)
    }

    /// Undecided transfers in creation order (the back-office queue)
    pub fn list_pending(&self) -> Vec<TransferRecord> {
        self.store.pending()
    }
}
