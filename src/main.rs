//! bankcore - Money-Movement Demo
//!
//! Entry point. Boots the core from YAML config and walks the money paths
//! end to end:
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌───────────────┐    ┌──────────┐
//! │  Config  │───▶│  Registry  │───▶│   Workflows   │───▶│  Ledger  │
//! │  (YAML)  │    │  + Rates   │    │ (gate+store)  │    │ (arena)  │
//! └──────────┘    └────────────┘    └───────────────┘    └──────────┘
//! ```
//!
//! Covers account opening, a cross-currency transfer through back-office
//! confirmation, limit request/approval, a privileged direct change, and
//! a concurrent confirmation race.

use std::sync::{Arc, Barrier};
use std::thread;

use anyhow::Result;
use rust_decimal::Decimal;

use bankcore::config::AppConfig;
use bankcore::currency::CurrencyCode;
use bankcore::ledger::Ledger;
use bankcore::logging::init_logging;
use bankcore::policy::{Actor, ApprovalGate};
use bankcore::workflow::{LimitChangeWorkflow, TransferRequest, TransferStatus, TransferWorkflow};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn amount(s: &str) -> Decimal {
    s.parse().expect("literal amount")
}

// ============================================================
// MAIN
// ============================================================

fn main() -> Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env);
    let _log_guard = init_logging(&app_config);

    tracing::info!("Starting bankcore in {} mode", env);
    println!(
        "🚀 bankcore: money-movement core (build {})",
        env!("GIT_HASH")
    );

    // Bootstrap from config
    let registry = Arc::new(app_config.bank.build_registry()?);
    let rates = Arc::new(app_config.bank.build_rate_table(Arc::clone(&registry))?);
    println!(
        "Currencies registered: {}, seed quotes: {}",
        registry.len(),
        rates.len()
    );

    let ledger = Arc::new(Ledger::new());
    let gate = ApprovalGate;
    let transfers = Arc::new(TransferWorkflow::new(
        Arc::clone(&ledger),
        Arc::clone(&rates),
        gate,
    ));
    let limits = LimitChangeWorkflow::new(Arc::clone(&ledger), gate);

    let usd = CurrencyCode::new("USD")?;
    let eur = CurrencyCode::new("EUR")?;

    // Clients and staff
    let alice = Actor::client(1001);
    let bob = Actor::client(1002);
    let teller = Actor::employee(2000);
    let admin = Actor::admin(3000);

    // ============================================================
    // ACCOUNTS
    // ============================================================

    let alice_usd = ledger.open_account(
        alice.id,
        "alice checking",
        usd.clone(),
        amount("100.00"),
        Decimal::ZERO,
    )?;
    let bob_eur = ledger.open_account(
        bob.id,
        "bob checking",
        eur.clone(),
        amount("10.00"),
        Decimal::ZERO,
    )?;
    println!(
        "\n[accounts] opened #{} (USD 100.00) and #{} (EUR 10.00)",
        alice_usd, bob_eur
    );

    // ============================================================
    // TRANSFER: create -> confirm -> execute
    // ============================================================

    let record = transfers.create(
        &alice,
        TransferRequest {
            sender: alice_usd,
            receiver: bob_eur,
            amount: amount("60.00"),
        },
    )?;
    println!("\n[transfer] requested: {}", record.payload);
    println!(
        "[transfer] back-office queue: {} pending",
        transfers.list_pending().len()
    );

    let status = transfers.confirm_and_execute(&teller, record.id)?;
    println!("[transfer] {} -> {}", record.id, status);
    println!(
        "[transfer] balances now: sender {} / receiver {}",
        ledger.snapshot(alice_usd)?.balance,
        ledger.snapshot(bob_eur)?.balance,
    );

    // Re-confirming a settled request is a no-op
    let again = transfers.confirm_and_execute(&teller, record.id)?;
    println!("[transfer] re-confirm reports {} without moving money", again);

    // ============================================================
    // CREDIT LIMIT: request -> approve, then a direct change
    // ============================================================

    let limit_req = limits.request(&alice, alice_usd, amount("500"))?;
    println!("\n[limit] requested: {}", limit_req.payload);
    limits.approve(&teller, limit_req.id)?;
    println!(
        "[limit] approved, account limit is now {}",
        ledger.snapshot(alice_usd)?.credit_limit
    );

    limits.change_limit_direct(&admin, alice_usd, amount("750"))?;
    println!(
        "[limit] admin direct change, account limit is now {}",
        ledger.snapshot(alice_usd)?.credit_limit
    );

    // ============================================================
    // CONCURRENT CONFIRMATION RACE
    // ============================================================

    // Two 40.00 transfers from a 50.00 account; the ledger admits exactly one
    let carol = Actor::client(1003);
    let carol_usd = ledger.open_account(
        carol.id,
        "carol checking",
        usd.clone(),
        amount("50.00"),
        Decimal::ZERO,
    )?;
    let first = transfers.create(
        &carol,
        TransferRequest {
            sender: carol_usd,
            receiver: bob_eur,
            amount: amount("40.00"),
        },
    )?;
    let second = transfers.create(
        &carol,
        TransferRequest {
            sender: carol_usd,
            receiver: bob_eur,
            amount: amount("40.00"),
        },
    )?;

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|id| {
            let transfers = Arc::clone(&transfers);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let teller = Actor::employee(2000);
                barrier.wait();
                transfers.confirm_and_execute(&teller, id)
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("confirm thread panicked"))
        .collect();
    let executed = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(TransferStatus::ConfirmedExecuted)))
        .count();
    println!(
        "\n[race] ✅ {} of 2 concurrent 40.00 confirmations executed from a 50.00 account",
        executed
    );
    println!("[race] carol balance: {}", ledger.snapshot(carol_usd)?.balance);

    // ============================================================
    // PORTFOLIO VIEW
    // ============================================================

    println!("\n[portfolio] bob's accounts:");
    for snapshot in ledger.snapshots_for_owner(bob.id) {
        println!(
            "  #{} {} {} balance {} (limit {})",
            snapshot.account_id, snapshot.name, snapshot.currency, snapshot.balance, snapshot.credit_limit
        );
    }

    tracing::info!("Demo complete");
    Ok(())
}
