//! Tripwire State Store Layer
//!
//! This crate provides the storage side of the circuit breaker: the
//! `StateStore` trait the breaker consumes, a SQLite implementation shared by
//! every process pointing at the same database file, and an in-process
//! implementation for single-process use and tests.
//!
//! Every trait operation is a single atomic store operation. Counter updates
//! are performed by the store itself (`counter = counter + 1`), never by
//! reading a value into the application and writing it back.

pub mod adapter;
pub mod connection;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod sqlite;

pub use adapter::StateStore;
pub use connection::{connect, connect_in_memory, database_exists, DatabaseConfig, DbPool};
pub use memory::MemoryStore;
pub use migrations::{current_version, optimize, run_migrations, verify_integrity};
pub use sqlite::SqliteStore;
