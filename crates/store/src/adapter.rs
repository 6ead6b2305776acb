//! The store contract consumed by the circuit state machine

use async_trait::async_trait;
use std::sync::Arc;
use tripwire_core::{CircuitRecord, Namespace, Result, Timestamp};

/// Atomic operations over namespace-keyed circuit records
///
/// Implementations must make each operation atomic at the store level.
/// Concurrent callers (in this process or in others sharing the store) may
/// invoke any operation on the same namespace at any time, and no increment
/// may be lost.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Adds one to the counter, creating the record at 1 if absent
    async fn upsert_and_increment(&self, namespace: &Namespace) -> Result<()>;

    /// Sets the close time only if the counter is at least `min_counter`
    async fn conditional_set_close_time(
        &self,
        namespace: &Namespace,
        close_time: Timestamp,
        min_counter: u64,
    ) -> Result<()>;

    /// Sets the counter to a fixed value, creating the record if absent
    ///
    /// The close time is left untouched.
    async fn upsert_counter(&self, namespace: &Namespace, value: u64) -> Result<()>;

    /// Reads counter and close time together in one consistent read
    async fn read_record(&self, namespace: &Namespace) -> Result<Option<CircuitRecord>>;
}

#[async_trait]
impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    async fn upsert_and_increment(&self, namespace: &Namespace) -> Result<()> {
        (**self).upsert_and_increment(namespace).await
    }

    async fn conditional_set_close_time(
        &self,
        namespace: &Namespace,
        close_time: Timestamp,
        min_counter: u64,
    ) -> Result<()> {
        (**self)
            .conditional_set_close_time(namespace, close_time, min_counter)
            .await
    }

    async fn upsert_counter(&self, namespace: &Namespace, value: u64) -> Result<()> {
        (**self).upsert_counter(namespace, value).await
    }

    async fn read_record(&self, namespace: &Namespace) -> Result<Option<CircuitRecord>> {
        (**self).read_record(namespace).await
    }
}
