//! `SQLite` database for peerwatch.

use std::path::Path;

use peerwatch_core::db::{self, DatabaseError};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Handle to the peer database. Cloning shares the pool.
#[derive(Clone)]
pub struct PeerDatabase {
    pool: Pool<Sqlite>,
}

impl PeerDatabase {
    /// Open or create the database at `path` and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::migrated(db::open_pool(path).await?).await
    }

    /// Fresh in-memory database with the current schema.
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(db::open_pool_in_memory().await?).await
    }

    async fn migrated(pool: Pool<Sqlite>) -> Result<Self, DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Peer database migrations complete");
        Ok(Self { pool })
    }

    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
