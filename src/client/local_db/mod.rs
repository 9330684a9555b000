//! # Local Database Module
//!
//! Durable key-value storage for the sync core, on SQLite through `sqlx`.
//! Everything the client keeps between runs lives in one `kv_store` table:
//! the draft backup, the last confirmed snapshot, the last sync time and a
//! handful of user settings.
//!
//! ## Key Components
//!
//! - `LocalDatabase`: connection pool, schema setup and the raw slot operations
//! - `schema.rs`: slot names and migrations
//! - `backup.rs`: the `BackupStore` trait the scheduler writes through
//! - `settings.rs`: auth flag, theme and API settings
//! - `memory.rs`: in-process `BackupStore` for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eventlog_pro::client::local_db::{BackupStore, LocalDatabase};
//!
//! # async fn demo() -> eventlog_pro::shared::SyncResult<()> {
//! let db = LocalDatabase::new().await?;
//! if let Some(snapshot) = db.load_latest_backup().await? {
//!     println!("draft from {}", snapshot.captured_at);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod memory;
pub mod schema;
pub mod settings;

pub use backup::BackupStore;
pub use memory::MemoryBackup;
pub use settings::{ApiSettings, Theme};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::shared::config::AppConfig;
use crate::shared::error::{SyncError, SyncResult};

/// Local database connection manager
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    pool: SqlitePool,
}

impl LocalDatabase {
    /// Open or create the database at the platform data directory
    pub async fn new() -> SyncResult<Self> {
        Self::open(Self::default_db_path()).await
    }

    /// Open the database named by the configuration, or the default one
    pub async fn from_config(config: &AppConfig) -> SyncResult<Self> {
        match &config.db_path {
            Some(path) => Self::open(path).await,
            None => Self::new().await,
        }
    }

    /// Open or create a database file
    pub async fn open(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::storage(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        tracing::debug!("Opened local database at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database; lives as long as the pool
    pub async fn in_memory() -> SyncResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Platform-specific location of the database file
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("eventlog-pro");
        path.push("local.db");
        path
    }

    /// Bring the schema up to date
    async fn init_schema(&self) -> SyncResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current = self.schema_version().await?;
        for migration in schema::pending_migrations(current) {
            let mut tx = self.pool.begin().await?;
            sqlx::query(migration.sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(migration.version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::info!("Applied local schema migration {} ({})", migration.version, migration.name);
        }
        Ok(())
    }

    /// Highest applied migration
    pub async fn schema_version(&self) -> SyncResult<i32> {
        let (version,): (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;
        Ok(version)
    }

    /// Write a slot, replacing any previous value
    pub async fn set_value(&self, key: &str, value: &str) -> SyncResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> SyncResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn remove_value(&self, key: &str) -> SyncResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub(crate) async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> SyncResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_value(key, &json).await
    }

    /// Read a JSON slot. A value that no longer parses is reported and
    /// treated as absent.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, key: &str) -> SyncResult<Option<T>> {
        let Some(raw) = self.get_value(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Ignoring corrupt local slot {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
