//! Integration tests running the same contract against every store

use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tripwire_core::{Namespace, Timestamp};
use tripwire_store::{DatabaseConfig, MemoryStore, SqliteStore, StateStore};

async fn stores() -> Vec<(&'static str, Arc<dyn StateStore>)> {
    let memory: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let sqlite: Arc<dyn StateStore> =
        Arc::new(SqliteStore::in_memory().await.expect("in-memory sqlite"));
    vec![("memory", memory), ("sqlite", sqlite)]
}

fn ns(name: &str) -> Namespace {
    Namespace::new(name).expect("valid namespace")
}

#[tokio::test]
async fn test_fresh_namespace_has_no_record() {
    for (name, store) in stores().await {
        let record = store.read_record(&ns("fresh")).await.unwrap();
        assert!(record.is_none(), "{} should have no record", name);
    }
}

#[tokio::test]
async fn test_threshold_crossing_sets_close_time() {
    for (name, store) in stores().await {
        let circuit = ns("api");
        let close = Timestamp::now().saturating_add(Duration::from_secs(10));

        for _ in 0..3 {
            store.upsert_and_increment(&circuit).await.unwrap();
            store.conditional_set_close_time(&circuit, close, 3).await.unwrap();
        }

        let record = store.read_record(&circuit).await.unwrap().unwrap();
        assert_eq!(record.counter, 3, "{}", name);
        assert_eq!(record.close_time, Some(close), "{}", name);
        assert!(record.is_open_at(Timestamp::now()), "{}", name);
    }
}

#[tokio::test]
async fn test_below_threshold_never_sets_close_time() {
    for (name, store) in stores().await {
        let circuit = ns("api");
        let close = Timestamp::now().saturating_add(Duration::from_secs(10));

        for _ in 0..2 {
            store.upsert_and_increment(&circuit).await.unwrap();
            store.conditional_set_close_time(&circuit, close, 3).await.unwrap();
        }

        let record = store.read_record(&circuit).await.unwrap().unwrap();
        assert_eq!(record.close_time, None, "{}", name);
    }
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    for (name, store) in stores().await {
        store.upsert_and_increment(&ns("c1")).await.unwrap();
        store.upsert_and_increment(&ns("c1")).await.unwrap();

        assert!(store.read_record(&ns("c2")).await.unwrap().is_none(), "{}", name);

        store.upsert_counter(&ns("c2"), 0).await.unwrap();
        let c1 = store.read_record(&ns("c1")).await.unwrap().unwrap();
        assert_eq!(c1.counter, 2, "{}", name);
    }
}

#[tokio::test]
async fn test_separate_connections_to_one_file_agree() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();

    let writer = SqliteStore::open(DatabaseConfig::new(path.clone())).await.unwrap();
    let reader = SqliteStore::open(DatabaseConfig::new(path)).await.unwrap();

    writer.upsert_and_increment(&ns("payments")).await.unwrap();
    writer.upsert_counter(&ns("payments"), 0).await.unwrap();
    writer.upsert_and_increment(&ns("payments")).await.unwrap();

    let record = reader.read_record(&ns("payments")).await.unwrap().unwrap();
    assert_eq!(record.counter, 1);
}
