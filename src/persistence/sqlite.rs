//! SQLite connection pool and transaction entry points.

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::error::GatewayError;

/// Handle to the single-file relational store.
///
/// Multi-statement operations obtain a [`Transaction`] through
/// [`Database::begin`] and pass `&mut *tx` to the query modules, so that a
/// balance change and its ledger entries commit or roll back together.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `url`.
    ///
    /// File databases use WAL journaling; every connection enables foreign
    /// keys and waits up to five seconds on a locked database.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the URL is invalid or
    /// the database cannot be opened.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !url.contains(":memory:") {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(url, max_connections, "database connected");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool is pinned to a single connection that is never recycled,
    /// since each SQLite in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on failure.
    pub async fn in_memory() -> Result<Self, GatewayError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on failure.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, GatewayError> {
        Ok(self.pool.begin().await?)
    }

    /// Checks out a connection for standalone reads.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on failure.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, GatewayError> {
        Ok(self.pool.acquire().await?)
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
