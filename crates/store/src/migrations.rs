//! Database migrations

use crate::DbPool;
use sqlx::{Executor, SqliteConnection};
use tripwire_core::StoreError;

/// Versioned schema changes, applied in order
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/001_circuit_counters.sql"))];

/// Current database schema version
pub const CURRENT_VERSION: i64 = 1;

/// Returns the current migration version
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
///
/// The whole check-then-apply sequence holds the SQLite write lock
/// (`BEGIN IMMEDIATE`), so processes opening a fresh database at the same
/// time apply each migration exactly once. Others wait on `busy_timeout`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    let mut pooled = pool
        .acquire()
        .await
        .map_err(|e| StoreError::unavailable("Failed to acquire migration connection", e))?;
    let conn: &mut SqliteConnection = &mut pooled;

    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::unavailable("Failed to begin migration", e))?;

    let outcome = match apply_pending(&mut *conn).await {
        Ok(applied) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| applied)
            .map_err(|e| StoreError::query("Failed to commit migration", e)),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(applied) => {
            for version in applied {
                log::info!("Applied circuit store migration {:03}", version);
            }
            Ok(())
        }
        Err(e) => {
            // The connection goes back to the pool; leave no transaction open
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                log::warn!("Failed to roll back migration: {}", rollback);
            }
            Err(e)
        }
    }
}

/// Applies every migration not yet recorded; runs inside the caller's transaction
async fn apply_pending(conn: &mut SqliteConnection) -> Result<Vec<i64>, StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::query("Failed to create migrations table", e))?;

    let mut applied = Vec::new();
    for (version, sql) in MIGRATIONS {
        if apply_migration(&mut *conn, *version, sql).await? {
            applied.push(*version);
        }
    }
    Ok(applied)
}

/// Runs a single migration if not already applied
async fn apply_migration(
    conn: &mut SqliteConnection,
    version: i64,
    sql: &str,
) -> Result<bool, StoreError> {
    let recorded: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::query("Failed to check migration status", e))?;

    if recorded.is_some() {
        return Ok(false);
    }

    // Same call `RawSql::execute` forwards to; called directly so the future stays `Send`
    (&mut *conn)
        .execute(sqlx::raw_sql(sql))
        .await
        .map_err(|e| StoreError::Migration {
            version: format!("{:03}", version),
            reason: e.to_string(),
        })?;

    sqlx::query("INSERT OR IGNORE INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query("Failed to record migration", e))?;

    Ok(true)
}

/// Verifies database integrity
pub async fn verify_integrity(pool: &DbPool) -> Result<(), StoreError> {
    let result: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::query("Failed to check integrity", e))?;

    if result != "ok" {
        return Err(StoreError::corrupted(format!(
            "Database integrity check failed: {}",
            result
        )));
    }

    Ok(())
}

/// Optimizes the database
pub async fn optimize(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query("PRAGMA optimize")
        .execute(pool)
        .await
        .map_err(|e| StoreError::query("Failed to optimize database", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let versions: Vec<i64> =
            sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
                .fetch_all(&pool)
                .await
                .unwrap();

        assert_eq!(versions, vec![1]);
        assert_eq!(current_version(), 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_counter_table_rejects_negative() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query("INSERT INTO circuit_counters (name, counter) VALUES ('x', -1)")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_verify_integrity() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        verify_integrity(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_optimize() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        optimize(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_migration_leaves_no_open_transaction() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await.unwrap();
        let err = apply_migration(&mut conn, 99, "CREATE TABLE broken (").await;
        assert!(matches!(err, Err(StoreError::Migration { .. })));
        sqlx::query("ROLLBACK").execute(&mut *conn).await.unwrap();
        drop(conn);

        // The single pooled connection can start a new write transaction
        run_migrations(&pool).await.unwrap();
        verify_integrity(&pool).await.unwrap();
    }
}
