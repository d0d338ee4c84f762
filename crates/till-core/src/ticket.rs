//! # Ticket Operations
//!
//! Editing operations on the in-progress sale.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ticket Operations                                    │
//! │                                                                         │
//! │  Operator Action          Method                  Ticket Change         │
//! │  ───────────────          ──────                  ─────────────         │
//! │                                                                         │
//! │  Ring up service ───────► add_line() ───────────► lines.push(line)      │
//! │                                                                         │
//! │  Assign stylist ────────► update_line() ────────► lines[i].staff_id     │
//! │                                                                         │
//! │  Remove line ───────────► remove_line() ────────► lines.remove(i)       │
//! │                                                                         │
//! │  Discount / tip ────────► set_discount/set_tip ─► discount / tip        │
//! │                                                                         │
//! │  After settlement ──────► clear() ──────────────► empty ticket          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation validates its input first and leaves the ticket untouched
//! when validation fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, RoundingMode, TaxRate};
use crate::totals::{compute_totals, Totals};
use crate::types::{LineItem, Ticket};
use crate::validation::{
    validate_discount, validate_entity_id, validate_notes, validate_price, validate_quantity,
    validate_reference_id, validate_ticket_size, validate_tip,
};

/// A partial edit of one line. `None` fields are left as they are.
///
/// `staff_id: Some(None)` un-assigns the staff member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineUpdate {
    pub quantity: Option<i64>,
    pub unit_price: Option<Money>,
    pub discount: Option<Money>,
    #[ts(optional = nullable)]
    pub staff_id: Option<Option<String>>,
}

impl Ticket {
    /// Creates an empty ticket.
    pub fn new() -> Self {
        Ticket {
            lines: Vec::new(),
            customer_id: None,
            appointment_id: None,
            branch_id: None,
            notes: None,
            transaction_date: None,
            discount: Money::zero(),
            tip: Money::zero(),
            opened_at: Utc::now(),
        }
    }

    /// Adds a line and returns its id.
    ///
    /// ## Errors
    /// - `TicketTooLarge` when the ticket already holds the maximum lines
    /// - `Validation` for a blank entity id, bad quantity or negative price
    pub fn add_line(&mut self, line: LineItem) -> CoreResult<String> {
        validate_ticket_size(self.lines.len()).map_err(|_| CoreError::TicketTooLarge {
            max: crate::MAX_TICKET_LINES,
        })?;
        validate_entity_id(&line.entity_id)?;
        check_quantity(line.quantity)?;
        validate_price(line.unit_price)?;
        validate_discount(line.discount)?;

        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    /// Applies a partial update to the line with the given id.
    ///
    /// Validation runs on the whole update before anything changes.
    pub fn update_line(&mut self, line_id: &str, update: LineUpdate) -> CoreResult<()> {
        if let Some(qty) = update.quantity {
            check_quantity(qty)?;
        }
        if let Some(price) = update.unit_price {
            validate_price(price)?;
        }
        if let Some(discount) = update.discount {
            validate_discount(discount)?;
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        if let Some(qty) = update.quantity {
            line.quantity = qty;
        }
        if let Some(price) = update.unit_price {
            line.unit_price = price;
        }
        if let Some(discount) = update.discount {
            line.discount = discount;
        }
        if let Some(staff) = update.staff_id {
            line.staff_id = staff.filter(|s| !s.trim().is_empty());
        }
        Ok(())
    }

    /// Removes a line by id and returns it.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<LineItem> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        Ok(self.lines.remove(index))
    }

    /// Returns the line with the given id.
    pub fn line(&self, line_id: &str) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Sets or clears the customer reference.
    pub fn set_customer(&mut self, customer_id: Option<String>) -> CoreResult<()> {
        self.customer_id = normalize_reference(customer_id, "customer_id")?;
        Ok(())
    }

    /// Sets or clears the branch reference.
    pub fn set_branch(&mut self, branch_id: Option<String>) -> CoreResult<()> {
        self.branch_id = normalize_reference(branch_id, "branch_id")?;
        Ok(())
    }

    /// Sets or clears the appointment reference.
    pub fn set_appointment(&mut self, appointment_id: Option<String>) -> CoreResult<()> {
        self.appointment_id = normalize_reference(appointment_id, "appointment_id")?;
        Ok(())
    }

    /// Sets the free-text notes. Blank notes are stored as `None`.
    pub fn set_notes(&mut self, notes: Option<String>) -> CoreResult<()> {
        if let Some(ref n) = notes {
            validate_notes(n)?;
        }
        self.notes = notes.filter(|n| !n.trim().is_empty());
        Ok(())
    }

    /// Overrides the transaction date (back-dated entry).
    pub fn set_transaction_date(&mut self, date: Option<DateTime<Utc>>) {
        self.transaction_date = date;
    }

    /// Sets the ticket-level discount.
    pub fn set_discount(&mut self, discount: Money) -> CoreResult<()> {
        validate_discount(discount)?;
        self.discount = discount;
        Ok(())
    }

    /// Sets the tip.
    pub fn set_tip(&mut self, tip: Money) -> CoreResult<()> {
        validate_tip(tip)?;
        self.tip = tip;
        Ok(())
    }

    /// Empties the ticket for the next sale.
    pub fn clear(&mut self) {
        *self = Ticket::new();
    }

    /// Checks if the ticket has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Derives the totals for this ticket.
    pub fn totals(&self, tax_rate: TaxRate, rounding: RoundingMode) -> Totals {
        compute_totals(&self.lines, self.discount, tax_rate, self.tip, rounding)
    }
}

fn check_quantity(qty: i64) -> CoreResult<()> {
    if qty > crate::MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: qty,
            max: crate::MAX_ITEM_QUANTITY,
        });
    }
    validate_quantity(qty)?;
    Ok(())
}

fn normalize_reference(value: Option<String>, field: &str) -> CoreResult<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            let v = v.trim().to_string();
            validate_reference_id(&v, field)?;
            Ok(Some(v))
        }
        _ => Ok(None),
    }
}
