//! Database connection handling and data access.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, Transaction};

use crate::error::ApiError;

pub mod activations;
pub mod dbi;
pub mod performers;
pub mod query;
pub mod schema;
pub mod studios;
pub mod tables;

pub use activations::{ActivationRepository, PendingActivation};
pub use dbi::Dbi;
pub use performers::{
    Performer, PerformerAlias, PerformerBodyMod, PerformerRepository, PerformerUrl,
};
pub use studios::{Studio, StudioRepository, StudioUrl};

/// Shared handle to the SQLite pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Connect, retrying with a fixed delay. Useful when the data directory
    /// is mounted by an external process at startup.
    pub async fn connect_with_retry(
        database_url: &str,
        attempts: u32,
        delay: Duration,
    ) -> anyhow::Result<Self> {
        let mut last_err = None;
        for attempt in 1..=attempts {
            match Self::connect(database_url).await {
                Ok(db) => return Ok(db),
                Err(err) => {
                    tracing::warn!(attempt, %err, "database connection failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no connection attempts made")))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, ApiError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| ApiError::storage("acquire", "pool", e))
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, ApiError> {
        self.pool
            .begin()
            .await
            .map_err(|e| ApiError::storage("begin", "pool", e))
    }
}
