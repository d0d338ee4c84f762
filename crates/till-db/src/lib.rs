//! # till-db: Database Layer for Till POS
//!
//! Local SQLite store for settled checkouts, plus a [`TransactionApi`]
//! implementation so [`till_checkout::CheckoutSession`] can settle into it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  CheckoutSession::settle()                                             │
//! │       │  SettlementRequest                                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────────┐  ┌──────────────┐ │   │
//! │  │   │ LocalTrans-   │    │   Repositories    │  │  Migrations  │ │   │
//! │  │   │ actionApi     │───►│ (transaction.rs)  │  │  (embedded)  │ │   │
//! │  │   │  (api.rs)     │    │                   │  │              │ │   │
//! │  │   └───────────────┘    └─────────┬─────────┘  │ 001_init.sql │ │   │
//! │  │                                  ▼            └──────────────┘ │   │
//! │  │                        Database (pool.rs)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Transaction repository
//! - [`api`] - `TransactionApi` over the local store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use till_checkout::{CheckoutConfig, CheckoutSession};
//! use till_db::{Database, DbConfig, LocalTransactionApi};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//! let api = Arc::new(LocalTransactionApi::new(&db));
//! let session = CheckoutSession::new(api, CheckoutConfig::load_or_default(None));
//!
//! // later, for a reprint
//! let header = db.transactions().get_by_code("20260314-MAIN-0001").await?;
//! ```
//!
//! [`TransactionApi`]: till_checkout::TransactionApi

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::LocalTransactionApi;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::transaction::{StoredPayment, StoredTransaction, TransactionRepository};
