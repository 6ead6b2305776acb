//! SQLite-backed circuit store shared across processes

use crate::adapter::StateStore;
use crate::connection::{connect, connect_in_memory, DatabaseConfig};
use crate::migrations::run_migrations;
use crate::queries::counters;
use crate::DbPool;
use async_trait::async_trait;
use tripwire_core::{CircuitRecord, Namespace, Result, Timestamp};

/// Circuit store over a SQLite connection pool
///
/// Every process that opens the same database file observes and updates
/// the same circuits.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Wraps an existing pool; the schema must already be migrated
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connects to the configured database and applies pending migrations
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        let pool = connect(config).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Creates a migrated, private in-memory store
    pub async fn in_memory() -> Result<Self> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Lists every circuit record in the database
    pub async fn list_records(&self) -> Result<Vec<CircuitRecord>> {
        counters::list_counter_records(&self.pool).await
    }

    /// Closes the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn upsert_and_increment(&self, namespace: &Namespace) -> Result<()> {
        counters::increment_counter(&self.pool, namespace).await
    }

    async fn conditional_set_close_time(
        &self,
        namespace: &Namespace,
        close_time: Timestamp,
        min_counter: u64,
    ) -> Result<()> {
        let tripped =
            counters::set_closetime_if_tripped(&self.pool, namespace, close_time, min_counter)
                .await?;
        if tripped {
            log::debug!("Circuit '{}' close time set to {}", namespace, close_time);
        }
        Ok(())
    }

    async fn upsert_counter(&self, namespace: &Namespace, value: u64) -> Result<()> {
        counters::upsert_counter(&self.pool, namespace, value).await
    }

    async fn read_record(&self, namespace: &Namespace) -> Result<Option<CircuitRecord>> {
        counters::get_counter_record(&self.pool, namespace).await
    }
}
