use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::Result;

/// Durable set of (ad id, model) pairs that have already been notified.
/// Rows are written once and never updated or deleted; there is no expiry,
/// so the table grows for the lifetime of the deployment.
#[derive(Clone)]
pub struct SeenAdStore {
    pool: SqlitePool,
}

impl SeenAdStore {
    /// Open the backing database, creating file and schema if absent.
    /// Safe to call on every startup.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        info!("seen-ad store ready at {db_path}");
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS seen_ads (
                 ad_id TEXT NOT NULL,
                 model TEXT NOT NULL,
                 PRIMARY KEY (ad_id, model)
             )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// True iff exactly this (ad id, model) pair was marked before.
    pub async fn is_seen(&self, ad_id: &str, model: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM seen_ads WHERE ad_id = ? AND model = ?")
            .bind(ad_id)
            .bind(model)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Record the pair. Inserting an already-present pair is a no-op.
    pub async fn mark_seen(&self, ad_id: &str, model: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO seen_ads (ad_id, model) VALUES (?, ?)")
            .bind(ad_id)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
