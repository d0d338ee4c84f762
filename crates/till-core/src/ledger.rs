//! # Payment Ledger
//!
//! Ordered, in-memory list of tenders for the open ticket.
//!
//! ```text
//! add_payment(cash, 40.00)   ──►  [ cash 40.00 ]
//! add_payment(card, 60.00)   ──►  [ cash 40.00, card 60.00 ]
//! add_payment(card, 0.00)    ──►  ignored (None)
//! remove_payment(<cash id>)  ──►  [ card 60.00 ]
//! ```
//!
//! Payments are immutable. A correction is a remove followed by a re-add.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::types::{Payment, PaymentMethod};
use crate::validation::validate_payment_amount;

/// The tenders recorded against the current ticket, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLedger {
    payments: Vec<Payment>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tender and returns it.
    ///
    /// Non-positive amounts and amounts above
    /// [`MAX_PAYMENT_AMOUNT`](crate::validation::MAX_PAYMENT_AMOUNT) are
    /// ignored and yield `None`. A blank reference is stored as `None`.
    pub fn add_payment(
        &mut self,
        method: PaymentMethod,
        amount: Money,
        reference: Option<String>,
    ) -> Option<Payment> {
        if validate_payment_amount(amount).is_err() {
            return None;
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            method,
            amount,
            reference: reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            created_at: Utc::now(),
        };
        self.payments.push(payment.clone());
        Some(payment)
    }

    /// Removes a tender by id. Returns the removed tender; unknown ids are a
    /// no-op.
    pub fn remove_payment(&mut self, payment_id: &str) -> Option<Payment> {
        let index = self.payments.iter().position(|p| p.id == payment_id)?;
        Some(self.payments.remove(index))
    }

    pub fn clear(&mut self) {
        self.payments.clear();
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn get(&self, payment_id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == payment_id)
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Sum of all tenders.
    pub fn paid_amount(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Sum of the tenders of one method.
    pub fn paid_by(&self, method: PaymentMethod) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == method)
            .map(|p| p.amount)
            .sum()
    }
}
