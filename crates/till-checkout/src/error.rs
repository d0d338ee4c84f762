//! # Checkout Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Gate        │  │   Settlement    │  │    Configuration        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InProgress     │  │  Rejected       │  │  InvalidConfig          │ │
//! │  │  AlreadySettled │  │  Unavailable    │  │  ConfigLoadFailed       │ │
//! │  │  Core(..)       │  │  Timeout        │  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Policy problems are never errors here; they come back as
//! [`crate::SettleOutcome::Blocked`].

use thiserror::Error;
use till_core::CoreError;

use crate::api::SettlementError;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[derive(Debug, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Gate Errors
    // =========================================================================
    /// A settlement call is in flight; the ticket is frozen until it ends.
    #[error("Settlement in progress, the ticket cannot be changed")]
    SettlementInProgress,

    /// The ticket was already settled. Edit it to start the next sale.
    #[error("Ticket already settled as {transaction_code}")]
    AlreadySettled { transaction_code: String },

    /// Ticket edit rejected.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The transaction collaborator failed. Ticket and payments are intact.
    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid checkout configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl From<till_core::ValidationError> for CheckoutError {
    fn from(err: till_core::ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::ConfigSaveFailed(err.to_string())
    }
}

impl CheckoutError {
    /// True when the operator can simply press settle again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Settlement(_))
    }

    /// True for configuration problems.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CheckoutError::InvalidConfig(_)
                | CheckoutError::ConfigLoadFailed(_)
                | CheckoutError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through() {
        let err: CheckoutError = CoreError::LineNotFound("l-1".to_string()).into();
        assert_eq!(err.to_string(), "Line not found: l-1");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_settlement_error_is_retryable() {
        let err: CheckoutError = SettlementError::Unavailable("connection refused".into()).into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_config_categorization() {
        assert!(CheckoutError::InvalidConfig("x".into()).is_config_error());
        assert!(!CheckoutError::SettlementInProgress.is_config_error());
    }
}
