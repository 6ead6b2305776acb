//! Several workers starting against one fresh database file

use futures::future::join_all;
use tempfile::TempDir;
use tripwire_core::Namespace;
use tripwire_store::{DatabaseConfig, SqliteStore, StateStore};

const WORKERS: usize = 4;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_open_of_fresh_database() {
    for round in 0..10 {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir
            .path()
            .join("circuits.db")
            .to_string_lossy()
            .to_string();

        // Spawned so start-up runs the way a multi-task service would run it
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let path = path.clone();
                tokio::spawn(async move { SqliteStore::open(DatabaseConfig::new(path)).await })
            })
            .collect();

        let mut stores = Vec::new();
        for result in join_all(handles).await {
            let store = result
                .unwrap()
                .unwrap_or_else(|e| panic!("round {}: open failed: {}", round, e));
            stores.push(store);
        }

        let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
            .fetch_all(stores[0].pool())
            .await
            .unwrap();
        assert_eq!(versions, vec![1], "round {}", round);

        let namespace = Namespace::new("startup").unwrap();
        for store in &stores {
            store.upsert_and_increment(&namespace).await.unwrap();
        }
        let record = stores[0].read_record(&namespace).await.unwrap().unwrap();
        assert_eq!(record.counter, WORKERS as u64, "round {}", round);

        for store in stores {
            store.close().await;
        }
    }
}

#[tokio::test]
async fn test_reopen_migrated_database() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("circuits.db").to_string_lossy().to_string();

    let first = SqliteStore::open(DatabaseConfig::new(path.clone())).await.unwrap();
    first.upsert_counter(&Namespace::new("kept").unwrap(), 3).await.unwrap();
    first.close().await;

    let second = SqliteStore::open(DatabaseConfig::new(path)).await.unwrap();
    let record = second
        .read_record(&Namespace::new("kept").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.counter, 3);
}
