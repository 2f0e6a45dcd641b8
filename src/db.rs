//! SQLite connection lifecycle.
//!
//! [`Database`] owns the one connection pool used by the process. The pool
//! is created lazily on the first [`connect`](Database::connect) and reused
//! by every later call; [`close`](Database::close) releases it.
//!
//! # Write-Ahead Logging (WAL)
//!
//! WAL mode is enabled for all connections so that reads from the taxonomy
//! and stats routes do not block on an in-flight batch insert.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::config::DbConfig;
use crate::migrate;

/// Lazily connected handle to the corpus database.
pub struct Database {
    config: DbConfig,
    pool: Mutex<Option<SqlitePool>>,
}

impl Database {
    /// Create an unconnected handle. No I/O happens until [`connect`](Self::connect).
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
        }
    }

    /// Return the shared pool, connecting on first use.
    ///
    /// The first successful call creates the database file and its parent
    /// directory if needed and ensures the schema. Later calls return a
    /// handle to the same pool.
    pub async fn connect(&self) -> Result<SqlitePool> {
        let mut slot = self.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let pool = open_pool(&self.config).await?;
        migrate::ensure_schema(&pool).await?;
        tracing::info!(path = %self.config.path.display(), "connected to corpus database");

        *slot = Some(pool.clone());
        Ok(pool)
    }

    pub async fn is_connected(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    /// Checkpoint the WAL and close the pool.
    ///
    /// A no-op when never connected or already closed.
    pub async fn close(&self) -> Result<()> {
        let pool = match self.pool.lock().await.take() {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let checkpoint = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&pool)
            .await;
        pool.close().await;
        checkpoint?;

        tracing::info!("corpus database connection closed");
        Ok(())
    }
}

async fn open_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = &config.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db_config(tmp: &TempDir) -> DbConfig {
        DbConfig {
            path: tmp.path().join("nested").join("corpora.sqlite"),
            max_connections: 2,
        }
    }

    #[tokio::test]
    async fn test_connect_is_lazy_and_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = db_config(&tmp);
        let db = Database::new(config.clone());
        assert!(!db.is_connected().await);
        assert!(!config.path.exists());

        let first = db.connect().await.unwrap();
        let second = db.connect().await.unwrap();
        assert!(db.is_connected().await);
        assert!(config.path.exists());

        // Both handles share one pool: closing one closes the other.
        first.close().await;
        assert!(second.is_closed());
    }

    #[tokio::test]
    async fn test_close_without_connect_is_noop() {
        let tmp = TempDir::new().unwrap();
        let db = Database::new(db_config(&tmp));
        db.close().await.unwrap();
        db.close().await.unwrap();
        assert!(!db.is_connected().await);
    }

    #[tokio::test]
    async fn test_reconnect_after_close() {
        let tmp = TempDir::new().unwrap();
        let db = Database::new(db_config(&tmp));
        db.connect().await.unwrap();
        db.close().await.unwrap();
        assert!(!db.is_connected().await);

        let pool = db.connect().await.unwrap();
        assert!(!pool.is_closed());
        db.close().await.unwrap();
    }
}
