//! # Balance Resolver
//!
//! Compares what the ticket costs with what has been tendered.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  paid          = Σ payment amounts                                      │
//! │  remaining     = max(0, total − paid)                                   │
//! │  change        = max(0, paid − total)                                   │
//! │  is_fully_paid = remaining ≤ 0.01                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::PaymentLedger;
use crate::money::{Money, MONEY_TOLERANCE};

/// Payment state of the ticket. Reports only; resolving has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Balance {
    pub total: Money,
    pub paid: Money,
    pub remaining: Money,
    pub change: Money,
    pub is_fully_paid: bool,
}

impl Balance {
    /// Resolves the balance of `total` against the ledger.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Balance, Money, PaymentLedger, PaymentMethod};
    ///
    /// let mut ledger = PaymentLedger::new();
    /// ledger.add_payment(PaymentMethod::Cash, Money::from_cents(6000), None);
    ///
    /// let balance = Balance::resolve(Money::from_cents(5000), &ledger);
    /// assert_eq!(balance.change, Money::from_cents(1000));
    /// assert!(balance.remaining.is_zero());
    /// assert!(balance.is_fully_paid);
    /// ```
    pub fn resolve(total: Money, ledger: &PaymentLedger) -> Self {
        Self::from_paid(total, ledger.paid_amount())
    }

    /// Resolves the balance from an already summed paid amount.
    pub fn from_paid(total: Money, paid: Money) -> Self {
        let remaining = (total - paid).clamp_non_negative();
        let change = (paid - total).clamp_non_negative();

        Balance {
            total,
            paid,
            remaining,
            change,
            is_fully_paid: remaining <= MONEY_TOLERANCE,
        }
    }
}
