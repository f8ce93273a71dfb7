//! End-to-end money-movement scenarios
//!
//! Exercises the public API the way an embedding service would: accounts
//! through the ledger, transfers and limit changes through the workflows,
//! concurrency through real threads.

use std::sync::{Arc, Barrier};
use std::thread;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bankcore::currency::{CurrencyCode, CurrencyInfo, CurrencyRegistry};
use bankcore::error::BankError;
use bankcore::ledger::Ledger;
use bankcore::money::one_minor_unit;
use bankcore::policy::{Actor, ApprovalGate};
use bankcore::rates::RateTable;
use bankcore::workflow::{
    LimitChangeWorkflow, TransferRequest, TransferStatus, TransferWorkflow,
};

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn eur() -> CurrencyCode {
    CurrencyCode::new("EUR").unwrap()
}

/// USD and EUR registered, USD->EUR quoted at 0.90
fn rate_table() -> Arc<RateTable> {
    let mut registry = CurrencyRegistry::new();
    registry.register(CurrencyInfo::new(usd(), "US Dollar", 2));
    registry.register(CurrencyInfo::new(eur(), "Euro", 2));
    let table = RateTable::new(Arc::new(registry));
    table.apply_quote(usd(), eur(), dec!(0.90)).unwrap();
    Arc::new(table)
}

struct Bank {
    ledger: Arc<Ledger>,
    transfers: Arc<TransferWorkflow>,
    limits: Arc<LimitChangeWorkflow>,
}

fn bank() -> Bank {
    let rates = rate_table();
    let ledger = Arc::new(Ledger::new());
    let transfers = Arc::new(TransferWorkflow::new(
        Arc::clone(&ledger),
        Arc::clone(&rates),
        ApprovalGate,
    ));
    let limits = Arc::new(LimitChangeWorkflow::new(Arc::clone(&ledger), ApprovalGate));
    Bank {
        ledger,
        transfers,
        limits,
    }
}

fn transfer(sender: u64, receiver: u64, amount: Decimal) -> TransferRequest {
    TransferRequest {
        sender,
        receiver,
        amount,
    }
}

#[test]
fn qa_tc_worked_cross_currency_scenario() {
    let bank = bank();

    // Setup: sender USD 100.00, receiver EUR 10.00, USD->EUR at 0.90
    let sender = bank
        .ledger
        .open_account(1001, "sender usd", usd(), dec!(100.00), dec!(0))
        .unwrap();
    let receiver = bank
        .ledger
        .open_account(1002, "receiver eur", eur(), dec!(10.00), dec!(0))
        .unwrap();

    // Action: request 60.00 USD, then confirm
    let record = bank
        .transfers
        .create(&Actor::client(1001), transfer(sender, receiver, dec!(60.00)))
        .unwrap();
    assert_eq!(
        record.payload.converted_amount,
        dec!(54.00),
        "creation-time quote shown to the approver"
    );

    let status = bank
        .transfers
        .confirm_and_execute(&Actor::employee(2000), record.id)
        .unwrap();
    assert_eq!(status, TransferStatus::ConfirmedExecuted);

    // Verify: 100.00 - 60.00 = 40.00 and 10.00 + 54.00 = 64.00
    assert_eq!(bank.ledger.snapshot(sender).unwrap().balance, dec!(40.00));
    assert_eq!(bank.ledger.snapshot(receiver).unwrap().balance, dec!(64.00));
}

#[test]
fn qa_tc_settled_transfers_conserve_value_at_used_rates() {
    let bank = bank();
    let a = bank
        .ledger
        .open_account(1001, "a usd", usd(), dec!(1000.00), dec!(0))
        .unwrap();
    let b = bank
        .ledger
        .open_account(1002, "b eur", eur(), dec!(1000.00), dec!(0))
        .unwrap();
    let teller = Actor::employee(2000);

    // Several settled transfers in both directions. EUR->USD resolves
    // through the reciprocal of the 0.90 quote.
    let usd_to_eur = [dec!(100.00), dec!(25.50), dec!(3.07)];
    let eur_to_usd = [dec!(40.00), dec!(7.77)];

    let mut a_delta = Decimal::ZERO;
    let mut b_delta = Decimal::ZERO;

    for amount in usd_to_eur {
        let record = bank
            .transfers
            .create(&Actor::client(1001), transfer(a, b, amount))
            .unwrap();
        bank.transfers.confirm_and_execute(&teller, record.id).unwrap();
        let settled = bank.transfers.get(record.id).unwrap();
        a_delta -= amount;
        b_delta += settled.payload.converted_amount;
    }
    for amount in eur_to_usd {
        let record = bank
            .transfers
            .create(&Actor::client(1002), transfer(b, a, amount))
            .unwrap();
        bank.transfers.confirm_and_execute(&teller, record.id).unwrap();
        let settled = bank.transfers.get(record.id).unwrap();
        b_delta -= amount;
        a_delta += settled.payload.converted_amount;
    }

    // Verify: each account moved by exactly the sum of its settled legs,
    // so value converted at the rates actually used nets to zero
    assert_eq!(
        bank.ledger.snapshot(a).unwrap().balance,
        dec!(1000.00) + a_delta
    );
    assert_eq!(
        bank.ledger.snapshot(b).unwrap().balance,
        dec!(1000.00) + b_delta
    );
    // Independent spot check of the rounded legs: 0.90 outbound,
    // reciprocal 1.11... inbound
    assert_eq!(bank.ledger.snapshot(a).unwrap().balance, dec!(924.50));
    assert_eq!(bank.ledger.snapshot(b).unwrap().balance, dec!(1067.94));
}

#[test]
fn qa_tc_parallel_debits_never_break_the_overdraft_band() {
    let ledger = Arc::new(Ledger::new());
    let account = ledger
        .open_account(1001, "hammered", usd(), dec!(100.00), dec!(25.00))
        .unwrap();

    // Setup: 8 threads race 200 debits of 1.00 against a 125.00 band
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = Arc::clone(&ledger);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut successes = 0u32;
            for _ in 0..25 {
                if ledger.reserve_and_debit(account, dec!(1.00)).is_ok() {
                    successes += 1;
                }
            }
            successes
        }));
    }
    let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Verify: exactly the band was consumed, never a cent beyond
    let snapshot = ledger.snapshot(account).unwrap();
    assert_eq!(total, 125, "every debit within the band must succeed");
    assert_eq!(snapshot.balance, dec!(-25.00));
    assert!(
        snapshot.balance >= -snapshot.credit_limit,
        "balance {} broke the -{} floor",
        snapshot.balance,
        snapshot.credit_limit
    );
}

#[test]
fn qa_tc_concurrent_confirmations_mutate_once() {
    let bank = bank();
    let sender = bank
        .ledger
        .open_account(1001, "sender usd", usd(), dec!(100.00), dec!(0))
        .unwrap();
    let receiver = bank
        .ledger
        .open_account(1002, "receiver eur", eur(), dec!(10.00), dec!(0))
        .unwrap();
    let record = bank
        .transfers
        .create(&Actor::client(1001), transfer(sender, receiver, dec!(60.00)))
        .unwrap();

    // Action: four tellers confirm the same request at once
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let transfers = Arc::clone(&bank.transfers);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let teller = Actor::employee(2000 + i);
                barrier.wait();
                transfers.confirm_and_execute(&teller, record.id)
            })
        })
        .collect();

    // Verify: every caller sees the same terminal status
    for handle in handles {
        assert_eq!(
            handle.join().unwrap().unwrap(),
            TransferStatus::ConfirmedExecuted
        );
    }

    // Exactly one balance mutation happened on each side
    let sender_snap = bank.ledger.snapshot(sender).unwrap();
    let receiver_snap = bank.ledger.snapshot(receiver).unwrap();
    assert_eq!(sender_snap.balance, dec!(40.00));
    assert_eq!(receiver_snap.balance, dec!(64.00));
    assert_eq!(sender_snap.version, 1, "sender mutated more than once");
    assert_eq!(receiver_snap.version, 1, "receiver mutated more than once");
}

#[test]
fn qa_tc_two_forty_dollar_transfers_from_fifty() {
    let bank = bank();

    // Setup: 50.00 balance, zero limit, two PENDING 40.00 transfers (the
    // advisory creation check passes for both while the balance is intact)
    let sender = bank
        .ledger
        .open_account(1001, "sender usd", usd(), dec!(50.00), dec!(0))
        .unwrap();
    let receiver = bank
        .ledger
        .open_account(1002, "receiver eur", eur(), dec!(10.00), dec!(0))
        .unwrap();
    let owner = Actor::client(1001);
    let first = bank
        .transfers
        .create(&owner, transfer(sender, receiver, dec!(40.00)))
        .unwrap();
    let second = bank
        .transfers
        .create(&owner, transfer(sender, receiver, dec!(40.00)))
        .unwrap();

    // Action: confirm both at once
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|id| {
            let transfers = Arc::clone(&bank.transfers);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let teller = Actor::employee(2000);
                barrier.wait();
                transfers.confirm_and_execute(&teller, id)
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Verify: exactly one executed, the loser failed on funds
    let executed = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(TransferStatus::ConfirmedExecuted)))
        .count();
    assert_eq!(executed, 1, "outcomes: {outcomes:?}");
    let failures: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    assert_eq!(failures, vec![&BankError::InsufficientFunds]);

    assert_eq!(bank.ledger.snapshot(sender).unwrap().balance, dec!(10.00));
    assert_eq!(bank.ledger.snapshot(receiver).unwrap().balance, dec!(46.00));

    // One request settled CONFIRMED_EXECUTED, the other FAILED
    let mut statuses = [
        bank.transfers.get(first.id).unwrap().status,
        bank.transfers.get(second.id).unwrap().status,
    ];
    statuses.sort_by_key(|s| s.id());
    assert_eq!(
        statuses,
        [TransferStatus::Failed, TransferStatus::ConfirmedExecuted]
    );
}

#[test]
fn qa_tc_conversion_round_trip_stays_within_one_minor_unit() {
    let rates = rate_table();

    for raw in ["0.01", "0.03", "1.00", "123.45", "9999.99"] {
        let x: Decimal = raw.parse().unwrap();
        let (to_eur, _) = rates.convert(x, &usd(), &eur()).unwrap();
        let (back, _) = rates.convert(to_eur, &eur(), &usd()).unwrap();
        assert!(
            (back - x).abs() <= one_minor_unit(2),
            "round trip drifted: {x} -> {to_eur} -> {back}"
        );
    }
}

#[test]
fn qa_tc_concurrent_limit_approvals_apply_once() {
    let bank = bank();
    let account = bank
        .ledger
        .open_account(1001, "limited", usd(), dec!(100.00), dec!(0))
        .unwrap();
    let record = bank
        .limits
        .request(&Actor::client(1001), account, dec!(500))
        .unwrap();

    // Action: four approvers race the same request
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let limits = Arc::clone(&bank.limits);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let approver = Actor::employee(2000 + i);
                barrier.wait();
                limits.approve(&approver, record.id)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    // Verify: the limit landed once. Version 2 = the pending mark at
    // request time plus a single limit application.
    let snapshot = bank.ledger.snapshot(account).unwrap();
    assert_eq!(snapshot.credit_limit, dec!(500));
    assert!(!snapshot.limit_change_pending);
    assert_eq!(snapshot.version, 2, "limit applied more than once");
}

#[test]
fn qa_tc_opposed_transfer_streams_do_not_deadlock() {
    let bank = bank();

    // Setup: two USD accounts; same-currency transfers resolve at rate 1
    let a = bank
        .ledger
        .open_account(1001, "a usd", usd(), dec!(1000.00), dec!(0))
        .unwrap();
    let b = bank
        .ledger
        .open_account(1002, "b usd", usd(), dec!(1000.00), dec!(0))
        .unwrap();

    // Action: a->b and b->a streams run full create+confirm cycles at once
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for (owner_id, sender, receiver) in [(1001u64, a, b), (1002u64, b, a)] {
        let transfers = Arc::clone(&bank.transfers);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let owner = Actor::client(owner_id);
            let teller = Actor::employee(2000);
            barrier.wait();
            for _ in 0..50 {
                let record = transfers
                    .create(&owner, transfer(sender, receiver, dec!(1.00)))
                    .unwrap();
                transfers
                    .confirm_and_execute(&teller, record.id)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Verify: 50 dollars each way, value conserved
    assert_eq!(bank.ledger.snapshot(a).unwrap().balance, dec!(1000.00));
    assert_eq!(bank.ledger.snapshot(b).unwrap().balance, dec!(1000.00));
}
