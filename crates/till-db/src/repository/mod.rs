//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ```text
//! LocalTransactionApi::settle(request)
//!      │
//!      ▼
//! TransactionRepository
//! ├── record(&self, request)       one SQLite transaction
//! ├── get_by_id / get_by_code      header lookups
//! ├── get_lines / get_payments     receipt reprint
//! └── count()
//!      │
//!      ▼
//! SQLite Database
//! ```

pub mod transaction;
