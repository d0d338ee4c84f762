//! # Database Pool
//!
//! Opens the till's SQLite file, applies pragmas and hands out repositories.
//!
//! ```text
//! DbConfig::new("till.db")          DbConfig::in_memory()
//!        │  WAL, busy timeout              │  one connection, no WAL
//!        └──────────────┬───────────────────┘
//!                       ▼
//!            Database::new(config).await
//!              ├─ connect pool (foreign_keys = ON)
//!              └─ run embedded migrations
//!                       │
//!                       ▼
//!            db.transactions() → TransactionRepository
//! ```
//!
//! File databases use WAL so a receipt reprint can read while a settlement
//! is writing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::transaction::TransactionRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings for the transaction store.
///
/// ```rust
/// use std::time::Duration;
/// use till_db::DbConfig;
///
/// let config = DbConfig::new("/var/lib/till/till.db")
///     .max_connections(4)
///     .busy_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_connections, 4);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections. One till rarely needs more than a
    /// handful.
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,

    /// How long SQLite retries on a locked database before failing.
    pub busy_timeout: Duration,

    pub idle_timeout: Duration,

    /// Apply pending migrations in [`Database::new`].
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// A private in-memory database.
    ///
    /// Pinned to a single connection that never idles out: every SQLite
    /// connection to `:memory:` sees its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            // off by default in SQLite; line and payment rows depend on it
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the pooled store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, migrates.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening transaction store");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            // recycling the only in-memory connection would wipe the data
            .max_lifetime((!config.is_in_memory()).then(|| Duration::from_secs(1800)))
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    /// Every later query fails with [`DbError::ConnectionFailed`].
    pub async fn close(&self) {
        info!("Closing transaction store");
        self.pool.close().await;
    }

    /// `SELECT 1` round trip.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
