//! # Local Transaction API
//!
//! [`TransactionApi`] backed by the SQLite store, so a till can settle
//! without a network round trip.

use async_trait::async_trait;
use tracing::warn;

use crate::pool::Database;
use crate::repository::transaction::TransactionRepository;
use till_checkout::{SettlementError, SettlementRequest, SettlementResponse, TransactionApi};

/// Settles tickets into the local database.
#[derive(Debug, Clone)]
pub struct LocalTransactionApi {
    transactions: TransactionRepository,
}

impl LocalTransactionApi {
    pub fn new(db: &Database) -> Self {
        LocalTransactionApi {
            transactions: db.transactions(),
        }
    }
}

#[async_trait]
impl TransactionApi for LocalTransactionApi {
    async fn settle(
        &self,
        request: SettlementRequest,
    ) -> Result<SettlementResponse, SettlementError> {
        self.transactions.record(&request).await.map_err(|e| {
            warn!(error = %e, customer = %request.customer_id, "Local settlement failed");
            SettlementError::from(e)
        })
    }
}
