//! # Domain Types
//!
//! Core domain types used throughout the checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Ticket      │   │    LineItem     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  lines          │──►│  id (UUID)      │   │  id (UUID)      │       │
//! │  │  customer_id?   │   │  entity_id      │   │  method         │       │
//! │  │  branch_id?     │   │  item_type      │   │  amount         │       │
//! │  │  appointment?   │   │  quantity       │   │  reference?     │       │
//! │  │  discount, tip  │   │  unit_price     │   └─────────────────┘       │
//! │  └─────────────────┘   │  discount       │                             │
//! │                        │  staff_id?      │   ┌─────────────────┐       │
//! │                        └─────────────────┘   │ PaymentMethod   │       │
//! │  ┌─────────────────┐                         │  Cash           │       │
//! │  │    ItemType     │                         │  Card           │       │
//! │  │  Service        │                         │  Voucher        │       │
//! │  │  Product        │                         └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A line freezes the name and price of the service or product at the moment
//! it is rung up. Later catalogue edits never change an open ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Item Type
// =============================================================================

/// What a line sells.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A service performed by a staff member (haircut, manicure).
    Service,
    /// A retail product. No staff assignment needed.
    Product,
}

impl ItemType {
    /// Services must be assigned to a staff member before settlement.
    #[inline]
    pub const fn requires_staff(&self) -> bool {
        matches!(self, ItemType::Service)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Service => write!(f, "service"),
            ItemType::Product => write!(f, "product"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a tender was paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. The only method that can produce change.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Gift card or prepaid voucher.
    Voucher,
}

impl PaymentMethod {
    /// Parses the loose names the UI sends ("credit", "gift card", ...).
    ///
    /// Returns `None` for anything unrecognised.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Some(PaymentMethod::Card),
            "voucher" | "gift" | "gift card" | "giftcard" => Some(PaymentMethod::Voucher),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Voucher => write!(f, "voucher"),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Line identity (UUID v4), assigned when the line is added.
    pub id: String,

    /// Service or product id in the catalogue.
    pub entity_id: String,

    pub item_type: ItemType,

    /// Display name at time of adding (frozen).
    pub name: String,

    /// Units sold. Always positive.
    pub quantity: i64,

    /// Price of one unit at time of adding (frozen). Never negative.
    pub unit_price: Money,

    /// Absolute discount on the whole line.
    pub discount: Money,

    /// Staff member performing the service.
    pub staff_id: Option<String>,
}

impl LineItem {
    /// Creates a service line with no discount and no staff assigned.
    pub fn service(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        Self::new(entity_id, ItemType::Service, name, quantity, unit_price)
    }

    /// Creates a product line with no discount.
    pub fn product(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        Self::new(entity_id, ItemType::Product, name, quantity, unit_price)
    }

    fn new(
        entity_id: impl Into<String>,
        item_type: ItemType,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            entity_id: entity_id.into(),
            item_type,
            name: name.into(),
            quantity,
            unit_price,
            discount: Money::zero(),
            staff_id: None,
        }
    }

    /// Sets the line discount.
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Assigns the staff member.
    pub fn with_staff(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    /// Line total before discount (unit price × quantity).
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Line total after the line discount.
    #[inline]
    pub fn net(&self) -> Money {
        self.gross() - self.discount
    }

    /// True when this line still needs a staff assignment.
    pub fn is_missing_staff(&self) -> bool {
        self.item_type.requires_staff()
            && self
                .staff_id
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// The in-progress sale.
///
/// Owned by exactly one checkout session. Totals are never stored here;
/// they are re-derived through [`crate::totals::compute_totals`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ticket {
    pub lines: Vec<LineItem>,
    pub customer_id: Option<String>,
    pub appointment_id: Option<String>,
    pub branch_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    /// Ticket-level discount on top of line discounts.
    pub discount: Money,
    /// Operator-entered tip. Never taxed.
    pub tip: Money,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
}

impl Default for Ticket {
    fn default() -> Self {
        Ticket::new()
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A single tender toward the ticket total.
///
/// Never mutated after creation; a correction is a remove + re-add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub method: PaymentMethod,
    /// Always positive.
    pub amount: Money,
    /// External reference (card auth code, voucher number).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_totals() {
        let line = LineItem::product("p-1", "Shampoo", 3, Money::from_cents(299))
            .with_discount(Money::from_cents(97));
        assert_eq!(line.gross(), Money::from_cents(897));
        assert_eq!(line.net(), Money::from_cents(800));
    }

    #[test]
    fn test_missing_staff_only_for_services() {
        let service = LineItem::service("s-1", "Haircut", 1, Money::from_cents(3500));
        assert!(service.is_missing_staff());
        assert!(!service.clone().with_staff("staff-7").is_missing_staff());
        assert!(service.with_staff("  ").is_missing_staff());

        let product = LineItem::product("p-1", "Wax", 1, Money::from_cents(1200));
        assert!(!product.is_missing_staff());
    }

    #[test]
    fn test_line_ids_are_unique() {
        let a = LineItem::product("p-1", "Wax", 1, Money::from_cents(1200));
        let b = LineItem::product("p-1", "Wax", 1, Money::from_cents(1200));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::from_label("Cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_label("debit"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::from_label("gift card"), Some(PaymentMethod::Voucher));
        assert_eq!(PaymentMethod::from_label("bitcoin"), None);
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&ItemType::Service).unwrap(), "\"service\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::Voucher).unwrap(), "\"voucher\"");
    }
}
