//! In-process circuit store

use crate::adapter::StateStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tripwire_core::{CircuitRecord, Namespace, Result, StoreError, Timestamp};

/// Circuit store held in process memory
///
/// Clones share the same records, so every guard built from clones of one
/// `MemoryStore` sees the same circuits. State does not outlive the process
/// and is not visible to other processes; use `SqliteStore` for that.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<Namespace, CircuitRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every record, ordered by namespace
    pub fn records(&self) -> Result<Vec<CircuitRecord>> {
        let records = self.lock()?;
        let mut all: Vec<CircuitRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        Ok(all)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Namespace, CircuitRecord>>> {
        self.records.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn upsert_and_increment(&self, namespace: &Namespace) -> Result<()> {
        let mut records = self.lock()?;
        records
            .entry(namespace.clone())
            .or_insert_with(|| CircuitRecord::new(namespace.clone()))
            .counter += 1;
        Ok(())
    }

    async fn conditional_set_close_time(
        &self,
        namespace: &Namespace,
        close_time: Timestamp,
        min_counter: u64,
    ) -> Result<()> {
        let mut records = self.lock()?;
        if let Some(record) = records.get_mut(namespace) {
            if record.counter >= min_counter {
                record.close_time = Some(close_time);
                log::debug!("Circuit '{}' close time set to {}", namespace, close_time);
            }
        }
        Ok(())
    }

    async fn upsert_counter(&self, namespace: &Namespace, value: u64) -> Result<()> {
        let mut records = self.lock()?;
        records
            .entry(namespace.clone())
            .or_insert_with(|| CircuitRecord::new(namespace.clone()))
            .counter = value;
        Ok(())
    }

    async fn read_record(&self, namespace: &Namespace) -> Result<Option<CircuitRecord>> {
        Ok(self.lock()?.get(namespace).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_absent_record_reads_none() {
        let store = MemoryStore::new();
        assert!(store.read_record(&ns("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_and_conditional_close() {
        let store = MemoryStore::new();
        let close = Timestamp::from_millis(1_000);

        store.upsert_and_increment(&ns("a")).await.unwrap();
        store.conditional_set_close_time(&ns("a"), close, 2).await.unwrap();
        assert_eq!(store.read_record(&ns("a")).await.unwrap().unwrap().close_time, None);

        store.upsert_and_increment(&ns("a")).await.unwrap();
        store.conditional_set_close_time(&ns("a"), close, 2).await.unwrap();
        let record = store.read_record(&ns("a")).await.unwrap().unwrap();
        assert_eq!(record.counter, 2);
        assert_eq!(record.close_time, Some(close));
    }

    #[tokio::test]
    async fn test_conditional_close_on_missing_is_noop() {
        let store = MemoryStore::new();
        store
            .conditional_set_close_time(&ns("a"), Timestamp::now(), 0)
            .await
            .unwrap();
        assert!(store.records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_keeps_close_time() {
        let store = MemoryStore::new();
        let close = Timestamp::from_millis(5_000);

        store.upsert_and_increment(&ns("a")).await.unwrap();
        store.conditional_set_close_time(&ns("a"), close, 1).await.unwrap();
        store.upsert_counter(&ns("a"), 0).await.unwrap();

        let record = store.read_record(&ns("a")).await.unwrap().unwrap();
        assert_eq!(record.counter, 0);
        assert_eq!(record.close_time, Some(close));
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryStore::new();
        let clone = store.clone();

        clone.upsert_counter(&ns("b"), 7).await.unwrap();
        store.upsert_counter(&ns("a"), 1).await.unwrap();

        let names: Vec<String> = store
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.namespace.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments() {
        let store = MemoryStore::new();
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_and_increment(&ns("hot")).await })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let record = store.read_record(&ns("hot")).await.unwrap().unwrap();
        assert_eq!(record.counter, 50);
    }
}
