//! # Seed Data Generator
//!
//! Rings up scripted checkouts through a real [`CheckoutSession`] so the
//! database holds realistic settled transactions for development.
//!
//! ## Usage
//! ```bash
//! # 50 checkouts (default)
//! cargo run -p till-db --bin seed
//!
//! # Custom amount
//! cargo run -p till-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Checkouts
//! Each checkout gets:
//! - A branch from [`BRANCHES`] and a customer `cust-NNNN`
//! - One to three services with an assigned stylist
//! - Every third checkout adds a retail product
//! - A tip on every other checkout
//! - Tenders alternating between exact card, cash with change, and a
//!   voucher plus cash split

use std::env;
use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use till_checkout::{CheckoutConfig, CheckoutSession, SettleOutcome};
use till_core::{LineItem, Money, PaymentMethod};
use till_db::{Database, DbConfig, LocalTransactionApi};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const BRANCHES: &[&str] = &["downtown", "harbor", "uptown"];

const STAFF: &[&str] = &["st-ana", "st-ben", "st-chloe", "st-dev"];

/// (entity id, name, price in cents)
const SERVICES: &[(&str, &str, i64)] = &[
    ("svc-cut", "Haircut", 3500),
    ("svc-color", "Colour", 8500),
    ("svc-blow", "Blow dry", 2500),
    ("svc-mani", "Manicure", 3000),
    ("svc-pedi", "Pedicure", 4000),
    ("svc-brow", "Brow shape", 1500),
];

const PRODUCTS: &[(&str, &str, i64)] = &[
    ("prd-sham", "Shampoo 250ml", 1899),
    ("prd-cond", "Conditioner 250ml", 1999),
    ("prd-wax", "Styling wax", 1450),
    ("prd-oil", "Hair oil", 2475),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of checkouts to settle (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till POS Seed Data Generator");
    println!("===============================");
    println!("Database:  {}", db_path);
    println!("Checkouts: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.transactions().count().await?;
    if existing > 0 {
        println!("  Database already has {} transactions, appending.", existing);
    }

    let config = CheckoutConfig::load_or_default(None);
    let api = Arc::new(LocalTransactionApi::new(&db));
    let session = CheckoutSession::new(api, config);

    println!();
    println!("Settling checkouts...");

    let start = Instant::now();
    let mut settled = 0usize;
    let mut takings = Money::zero();
    let mut last_code = None;

    for seed in 0..count {
        match ring_up(&session, seed).await {
            Ok(Some((code, total))) => {
                settled += 1;
                takings += total;
                last_code = Some(code);
                if settled % 25 == 0 {
                    println!("  Settled {} checkouts...", settled);
                }
            }
            Ok(None) => warn!(seed, "Checkout did not settle"),
            Err(e) => {
                eprintln!("Checkout {} failed: {}", seed, e);
                session.reset().await?;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Settled {} checkouts in {:?}", settled, elapsed);
    println!(
        "  Takings: {}",
        session.config().format_currency(takings)
    );
    if let Some(code) = last_code {
        println!("  Last transaction: {}", code);
    }
    println!("  Stored transactions: {}", db.transactions().count().await?);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Rings up and settles one scripted checkout.
///
/// Returns the transaction code and total when it settled.
async fn ring_up(
    session: &CheckoutSession,
    seed: usize,
) -> Result<Option<(String, Money)>, Box<dyn std::error::Error>> {
    session
        .set_branch(Some(BRANCHES[seed % BRANCHES.len()].to_string()))
        .await?;
    session
        .set_customer(Some(format!("cust-{:04}", seed % 500)))
        .await?;

    for n in 0..(1 + seed % 3) {
        let (entity_id, name, cents) = SERVICES[(seed + n * 7) % SERVICES.len()];
        let staff = STAFF[(seed + n) % STAFF.len()];
        session
            .add_line(LineItem::service(entity_id, name, 1, Money::from_cents(cents)).with_staff(staff))
            .await?;
    }

    if seed % 3 == 0 {
        let (entity_id, name, cents) = PRODUCTS[seed % PRODUCTS.len()];
        session
            .add_line(LineItem::product(entity_id, name, 1 + (seed % 2) as i64, Money::from_cents(cents)))
            .await?;
    }

    if seed % 2 == 1 {
        session.set_tip(Money::from_cents(500)).await?;
    }

    let total = session.totals().await.total;
    match seed % 3 {
        0 => {
            session
                .add_payment(PaymentMethod::Card, total, Some(format!("AUTH-{:06}", seed)))
                .await?;
        }
        1 => {
            // Round up to the next ten so the till gives change.
            let cash = Money::new((total.amount() / Decimal::TEN).ceil() * Decimal::TEN);
            session.add_payment(PaymentMethod::Cash, cash.max(total), None).await?;
        }
        _ => {
            let voucher = Money::from_cents(2000).min(total);
            session.add_payment(PaymentMethod::Voucher, voucher, Some(format!("GV-{:05}", seed))).await?;
            session.add_payment(PaymentMethod::Cash, total - voucher, None).await?;
        }
    }

    match session.settle().await? {
        SettleOutcome::Settled(receipt) => Ok(Some((receipt.transaction_code, receipt.totals.total))),
        other => {
            warn!(seed, outcome = ?other, "Unexpected settle outcome");
            session.reset().await?;
            Ok(None)
        }
    }
}
