//! # Settlement Contract
//!
//! The external transaction collaborator and its request/response types.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutSession::settle()                                              │
//! │        │                                                                │
//! │        │  SettlementRequest (ticket + payments, one atomic write)      │
//! │        ▼                                                                │
//! │  dyn TransactionApi ── Ok(SettlementResponse) ──► Receipt               │
//! │        │                                                                │
//! │        └──────────── Err(SettlementError) ──────► ticket left intact    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no automatic retry. A failed call leaves the session `Ready` so
//! the operator can try again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use till_core::{
    ItemType, LineItem, Money, Payment, PaymentLedger, PaymentMethod, TaxRate, Ticket, Totals,
};
use ts_rs::TS;

// =============================================================================
// Request
// =============================================================================

/// One ticket line as submitted for settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementItem {
    pub entity_id: String,
    pub item_type: ItemType,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub staff_id: Option<String>,
}

impl From<&LineItem> for SettlementItem {
    fn from(line: &LineItem) -> Self {
        SettlementItem {
            entity_id: line.entity_id.clone(),
            item_type: line.item_type,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.discount,
            staff_id: line.staff_id.clone(),
        }
    }
}

/// One tender as submitted for settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementPayment {
    pub method: PaymentMethod,
    pub amount: Money,
    pub reference: Option<String>,
}

impl From<&Payment> for SettlementPayment {
    fn from(payment: &Payment) -> Self {
        SettlementPayment {
            method: payment.method,
            amount: payment.amount,
            reference: payment.reference.clone(),
        }
    }
}

/// Everything the collaborator needs to record the sale in one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementRequest {
    pub customer_id: String,
    pub branch_id: Option<String>,
    pub appointment_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    pub items: Vec<SettlementItem>,
    pub payments: Vec<SettlementPayment>,
    pub tax_rate: TaxRate,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub tip_total: Money,
    pub total: Money,
    pub notes: Option<String>,
}

impl SettlementRequest {
    /// Builds the request from a gate-checked ticket.
    pub fn build(
        ticket: &Ticket,
        ledger: &PaymentLedger,
        totals: &Totals,
        tax_rate: TaxRate,
    ) -> Self {
        SettlementRequest {
            customer_id: ticket.customer_id.clone().unwrap_or_default(),
            branch_id: ticket.branch_id.clone(),
            appointment_id: ticket.appointment_id.clone(),
            transaction_date: ticket.transaction_date,
            items: ticket.lines.iter().map(SettlementItem::from).collect(),
            payments: ledger
                .payments()
                .iter()
                .map(SettlementPayment::from)
                .collect(),
            tax_rate,
            subtotal: totals.subtotal,
            discount_total: totals.discount,
            tax_total: totals.tax,
            tip_total: totals.tip,
            total: totals.total,
            notes: ticket.notes.clone(),
        }
    }

    /// Sum of the submitted tenders.
    pub fn paid_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

// =============================================================================
// Response
// =============================================================================

/// A line as recorded by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementLine {
    pub id: String,
    pub entity_id: String,
    pub item_type: ItemType,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub line_total: Money,
    pub staff_id: Option<String>,
}

/// The recorded transaction. Used verbatim for the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementResponse {
    pub transaction_id: String,
    pub transaction_code: String,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    pub lines: Vec<SettlementLine>,
}

// =============================================================================
// Errors
// =============================================================================

/// Failures of the settlement collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The collaborator refused the transaction (business rule, constraint).
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The collaborator could not be reached or failed internally.
    #[error("Transaction service unavailable: {0}")]
    Unavailable(String),

    /// No answer within the configured timeout.
    #[error("Transaction service did not answer within {secs} seconds")]
    Timeout { secs: u64 },
}

impl SettlementError {
    /// Transient failures where pressing settle again may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SettlementError::Unavailable(_) | SettlementError::Timeout { .. }
        )
    }
}

// =============================================================================
// Collaborator Trait
// =============================================================================

/// The transaction store that records a settled ticket.
///
/// Implementations must write the header, lines and payments atomically:
/// either everything is recorded or nothing is.
#[async_trait]
pub trait TransactionApi: Send + Sync {
    async fn settle(
        &self,
        request: SettlementRequest,
    ) -> Result<SettlementResponse, SettlementError>;
}
