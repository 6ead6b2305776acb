//! Circuit counter database operations
//!
//! Each function is exactly one SQL statement, so each is atomic under
//! SQLite's locking no matter how many processes share the file.

use crate::DbPool;
use tripwire_core::{CircuitRecord, Namespace, StoreError, Timestamp};

/// Adds one to a namespace's counter, inserting it at 1 if absent
pub async fn increment_counter(pool: &DbPool, namespace: &Namespace) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO circuit_counters (name, counter)
        VALUES (?, 1)
        ON CONFLICT(name) DO UPDATE SET counter = counter + 1
        "#,
    )
        .bind(namespace.as_str())
        .execute(pool)
        .await
        .map_err(|e| store_error("Failed to increment circuit counter", e))?;

    Ok(())
}

/// Sets the close time if the counter has reached `min_counter`
///
/// Returns true if a row was updated.
pub async fn set_closetime_if_tripped(
    pool: &DbPool,
    namespace: &Namespace,
    closetime: Timestamp,
    min_counter: u64,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE circuit_counters SET closetime = ? WHERE name = ? AND counter >= ?",
    )
        .bind(closetime.as_millis())
        .bind(namespace.as_str())
        .bind(to_db_counter(min_counter))
        .execute(pool)
        .await
        .map_err(|e| store_error("Failed to set circuit close time", e))?;

    Ok(result.rows_affected() > 0)
}

/// Sets a namespace's counter to a fixed value, leaving the close time alone
pub async fn upsert_counter(
    pool: &DbPool,
    namespace: &Namespace,
    value: u64,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO circuit_counters (name, counter)
        VALUES (?, ?)
        ON CONFLICT(name) DO UPDATE SET counter = excluded.counter
        "#,
    )
        .bind(namespace.as_str())
        .bind(to_db_counter(value))
        .execute(pool)
        .await
        .map_err(|e| store_error("Failed to set circuit counter", e))?;

    Ok(())
}

/// Gets counter and close time for a namespace in a single read
pub async fn get_counter_record(
    pool: &DbPool,
    namespace: &Namespace,
) -> Result<Option<CircuitRecord>, StoreError> {
    let row = sqlx::query("SELECT name, counter, closetime FROM circuit_counters WHERE name = ?")
        .bind(namespace.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| store_error("Failed to fetch circuit record", e))?;

    row.map(row_to_record).transpose()
}

/// Lists every circuit record, ordered by namespace
pub async fn list_counter_records(pool: &DbPool) -> Result<Vec<CircuitRecord>, StoreError> {
    let rows = sqlx::query("SELECT name, counter, closetime FROM circuit_counters ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| store_error("Failed to list circuit records", e))?;

    rows.into_iter().map(row_to_record).collect()
}

/// Removes a namespace's record entirely
///
/// Operator tooling only; the breaker never deletes records.
pub async fn delete_counter(pool: &DbPool, namespace: &Namespace) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM circuit_counters WHERE name = ?")
        .bind(namespace.as_str())
        .execute(pool)
        .await
        .map_err(|e| store_error("Failed to delete circuit record", e))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<CircuitRecord, StoreError> {
    use sqlx::Row;

    let name: String = row
        .try_get("name")
        .map_err(|e| StoreError::query("Missing circuit name", e))?;
    let counter: i64 = row
        .try_get("counter")
        .map_err(|e| StoreError::query("Missing circuit counter", e))?;
    let closetime: Option<i64> = row
        .try_get("closetime")
        .map_err(|e| StoreError::query("Missing circuit close time", e))?;

    let namespace = Namespace::new(name)?;
    let counter = u64::try_from(counter).map_err(|_| {
        StoreError::corrupted(format!("negative counter {} for {}", counter, namespace))
    })?;

    Ok(CircuitRecord {
        namespace,
        counter,
        close_time: closetime.map(Timestamp::from_millis),
    })
}

fn to_db_counter(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Separates "cannot reach the store" from "the statement failed"
fn store_error(message: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::unavailable(message, err)
        }
        other => StoreError::query(message, other),
    }
}
