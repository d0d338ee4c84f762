//! # Validation Module
//!
//! Field-level input validation for the checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                     │
//! │  └── Keypad formatting, immediate feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (field rules)                                    │
//! │  ├── Quantities, prices, discounts, references                         │
//! │  └── Returns Err(ValidationError), ticket stays untouched              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: policy module (enterprise rules)                             │
//! │  └── Branch, customer, staff, items → Vec<ValidationIssue> as data     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── NOT NULL, CHECK and foreign key constraints                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_entity_id, validate_quantity};
//!
//! validate_entity_id("svc-haircut").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_TICKET_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest reference id accepted (customer, branch, staff, appointment).
pub const MAX_REFERENCE_LEN: usize = 64;

/// Longest free-text note accepted on a ticket.
pub const MAX_NOTES_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the catalogue id of a service or product.
///
/// ## Rules
/// - Must not be blank
/// - At most 64 characters
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_entity_id;
///
/// assert!(validate_entity_id("svc-cut").is_ok());
/// assert!(validate_entity_id("   ").is_err());
/// ```
pub fn validate_entity_id(entity_id: &str) -> ValidationResult<()> {
    validate_reference_id(entity_id, "entity_id")
}

/// Validates an opaque reference id under the given field name.
pub fn validate_reference_id(value: &str, field: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    if value.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates ticket notes.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Validation Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Operator types quantity                                               │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → line is added / updated                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_ITEM_QUANTITY.to_string(),
        });
    }

    Ok(())
}

/// Highest accepted unit price.
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_TICKET_LINES`] this keeps every
/// total far inside what a `Decimal` can hold.
pub const MAX_UNIT_PRICE: Money = Money::new(Decimal::from_parts(1_000_000, 0, 0, false, 0));

/// Highest accepted single payment, discount or tip.
pub const MAX_PAYMENT_AMOUNT: Money = Money::new(Decimal::from_parts(10_000_000, 0, 0, false, 0));

fn check_upper(field: &str, value: Money, max: Money) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price. Zero is allowed (complimentary services).
///
/// ```rust
/// use till_core::{money::Money, validation::validate_price};
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// assert!(validate_price(Money::from_cents(100_000_001)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }
    check_upper("unit_price", price, MAX_UNIT_PRICE)
}

/// Validates a line or ticket discount amount.
pub fn validate_discount(discount: Money) -> ValidationResult<()> {
    if discount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        });
    }
    check_upper("discount", discount, MAX_PAYMENT_AMOUNT)
}

pub fn validate_tip(tip: Money) -> ValidationResult<()> {
    if tip.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "tip".to_string(),
        });
    }
    check_upper("tip", tip, MAX_PAYMENT_AMOUNT)
}

/// Validates a payment amount: positive and at most [`MAX_PAYMENT_AMOUNT`].
///
/// The ledger silently ignores amounts this rejects; persistence refuses
/// them with an error.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    check_upper("payment amount", amount, MAX_PAYMENT_AMOUNT)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates ticket size before adding another line.
///
/// ## Rules
/// - Must not exceed MAX_TICKET_LINES (100)
pub fn validate_ticket_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_TICKET_LINES {
        return Err(ValidationError::OutOfRange {
            field: "ticket lines".to_string(),
            min: "0".to_string(),
            max: MAX_TICKET_LINES.to_string(),
        });
    }
    Ok(())
}
