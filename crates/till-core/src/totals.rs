//! # Totals Engine
//!
//! Derives the ticket totals from its lines. Nothing here is stored; callers
//! re-derive after every edit.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ unit_price × quantity                                     │
//! │  discount = min(Σ line discounts + ticket discount, subtotal)           │
//! │  tax      = tax_rate × (subtotal − discount)       ← tip NOT included  │
//! │  tip      = operator-entered                                            │
//! │  total    = round(subtotal − discount + tax + tip)  ← only rounding    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, RoundingMode, TaxRate};
use crate::types::LineItem;

/// Derived totals of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub tip: Money,
    pub total: Money,
}

impl Totals {
    /// Taxable base (subtotal after discounts).
    pub fn taxable(&self) -> Money {
        self.subtotal - self.discount
    }
}

/// Computes the totals for a set of lines.
///
/// Pure and deterministic: the same inputs always yield the same output.
/// Intermediate values keep full precision and `rounding` is applied once,
/// to the grand total.
///
/// ## Example
/// ```rust
/// use till_core::{compute_totals, LineItem, Money, RoundingMode, TaxRate};
///
/// let lines = vec![LineItem::product("p-1", "Wax", 1, Money::from_cents(10000))];
/// let totals = compute_totals(
///     &lines,
///     Money::zero(),
///     TaxRate::from_bps(500),
///     Money::from_cents(2000),
///     RoundingMode::None,
/// );
///
/// assert_eq!(totals.tax, Money::from_cents(500));
/// assert_eq!(totals.total, Money::from_cents(12500));
/// ```
pub fn compute_totals(
    lines: &[LineItem],
    ticket_discount: Money,
    tax_rate: TaxRate,
    tip: Money,
    rounding: RoundingMode,
) -> Totals {
    let subtotal: Money = lines.iter().map(LineItem::gross).sum();
    let line_discounts: Money = lines.iter().map(|l| l.discount).sum();

    let discount = (line_discounts + ticket_discount)
        .clamp_non_negative()
        .min(subtotal.clamp_non_negative());

    let taxable = subtotal - discount;
    let tax = taxable.calculate_tax(tax_rate);
    let total = rounding.apply(taxable + tax + tip);

    Totals {
        subtotal,
        discount,
        tax,
        tip,
        total,
    }
}
