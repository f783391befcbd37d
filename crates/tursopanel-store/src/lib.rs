//! # tursopanel-store
//!
//! SQLite persistence for users, databases, groups, access-token records,
//! CLI sessions and stats buckets. Schema migrations are embedded and run on
//! open.
//!
//! Ids are `i64` in this crate (SQLite's integer type); token claims carry
//! them as `u64`, converted at the [`tursopanel_token::Directory`] boundary.

pub mod databases;
pub mod directory;
pub mod error;
pub mod groups;
pub mod models;
pub mod sessions;
pub mod stats;
pub mod tokens;
pub mod users;

pub use error::StoreError;
pub use models::{
    DatabaseRecord, GroupDeletion, GroupRecord, NewDatabase, NewToken, StatsRecord, StatsSample,
    TokenRecord, UserRecord,
};
pub use stats::bucket_start;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use tursopanel_core::StorageConfig;

/// Handle to the panel's SQLite database.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database file and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        ensure_parent_dir(&config.path)?;

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!(path = %config.path.display(), "opened store");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Everything lives on a single connection
    /// that is never recycled, otherwise the data would vanish.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn ensure_parent_dir(file_path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
