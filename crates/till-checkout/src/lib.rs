//! # till-checkout: Checkout Session for Till POS
//!
//! Wraps the pure rules of [`till_core`] in a session the UI shell can hold
//! on to: one ticket, one payment ledger, one settlement gate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UI shell (payment dialog)                                            │
//! │        │  add_line / add_payment / settle / snapshot                   │
//! │        ▼                                                                │
//! │   ┌──────────────────────────────────────────────────────────────┐     │
//! │   │              till-checkout (THIS CRATE)                      │     │
//! │   │                                                              │     │
//! │   │  session ── gate ── receipt          config (TOML + env)     │     │
//! │   │     │                                                        │     │
//! │   │     └──► api::TransactionApi (async trait)                   │     │
//! │   └──────────────────────────┬───────────────────────────────────┘     │
//! │                              ▼                                          │
//! │              till-db::LocalTransactionApi (SQLite)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use till_checkout::{CheckoutConfig, CheckoutSession, SettleOutcome, TransactionApi};
//! use till_core::{LineItem, Money, PaymentMethod};
//!
//! async fn ring_up(api: Arc<dyn TransactionApi>) -> till_checkout::CheckoutResult<()> {
//!     let session = CheckoutSession::new(api, CheckoutConfig::load_or_default(None));
//!     session.set_branch(Some("branch-1".into())).await?;
//!     session.set_customer(Some("cust-42".into())).await?;
//!     session
//!         .add_line(LineItem::service("svc-cut", "Haircut", 1, Money::from_cents(3500)).with_staff("st-7"))
//!         .await?;
//!     session.add_payment(PaymentMethod::Cash, Money::from_cents(4000), None).await?;
//!
//!     if let SettleOutcome::Settled(receipt) = session.settle().await? {
//!         println!("{}", receipt.render(session.config()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod receipt;
pub mod session;

pub use api::{
    SettlementError, SettlementItem, SettlementLine, SettlementPayment, SettlementRequest,
    SettlementResponse, TransactionApi,
};
pub use config::{CheckoutConfig, OrganizationConfig, PricingConfig, SettlementConfig};
pub use error::{CheckoutError, CheckoutResult};
pub use gate::GateState;
pub use receipt::Receipt;
pub use session::{CheckoutSession, CheckoutSnapshot, SettleOutcome};
