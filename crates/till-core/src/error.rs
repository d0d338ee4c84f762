//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Ticket editing failures                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-checkout errors                                                  │
//! │  ├── CheckoutError    - Session / gate failures                        │
//! │  └── SettlementError  - Collaborator failures (retryable)              │
//! │                                                                         │
//! │  till-db errors                                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → UI shell          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Policy problems (missing branch, customer, staff, items) are NOT errors.
//! They are reported as data through [`crate::policy::ValidationIssue`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while editing a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No line with this id exists on the ticket.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Ticket has reached the maximum number of lines.
    #[error("Ticket cannot have more than {max} lines")]
    TicketTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before a ticket is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
