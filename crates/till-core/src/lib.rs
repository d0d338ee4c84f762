//! # till-core: Pure Checkout Logic for Till POS
//!
//! This crate is the **heart** of the checkout. It holds the payment and
//! totals reconciliation rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Checkout Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI shell (payment dialog)                    │   │
//! │  │     Ticket UI ──► Tender UI ──► Settle button ──► Receipt UI    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               till-checkout (CheckoutSession)                   │   │
//! │  │      gate state machine, settlement call, receipts              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │  totals  │ │  ledger  │ │  policy  │          │   │
//! │  │   │  Money   │ │ Totals   │ │ Payments │ │  Issues  │          │   │
//! │  │   │ TaxRate  │ │ Balance  │ │          │ │          │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal `Money`, `TaxRate` and `RoundingMode`
//! - [`types`] - Ticket, line item and payment types
//! - [`ticket`] - Ticket editing operations
//! - [`totals`] - The totals engine
//! - [`ledger`] - The payment ledger
//! - [`balance`] - Paid / remaining / change resolution
//! - [`policy`] - Enterprise policy checks run before settlement
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{compute_totals, Money, RoundingMode, TaxRate};
//!
//! let totals = compute_totals(
//!     &[],
//!     Money::zero(),
//!     TaxRate::from_bps(500),
//!     Money::from_cents(2000),
//!     RoundingMode::None,
//! );
//!
//! // An empty ticket still carries the tip.
//! assert_eq!(totals.total, Money::from_cents(2000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod balance;
pub mod error;
pub mod ledger;
pub mod money;
pub mod policy;
pub mod ticket;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use balance::Balance;
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::PaymentLedger;
pub use money::{Money, RoundingMode, TaxRate, MONEY_TOLERANCE};
pub use policy::{check_tenders, check_ticket, IssueCategory, ValidationIssue};
pub use ticket::LineUpdate;
pub use totals::{compute_totals, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID used when a deployment does not configure one.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum lines allowed on a single ticket.
pub const MAX_TICKET_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
