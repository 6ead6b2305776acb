//! Shared domain types for Tripwire
//!
//! This crate holds the types every other crate in the workspace agrees on:
//! the namespace identity of a circuit, the persisted circuit record, the
//! millisecond timestamp used for close times, and the error taxonomy of
//! the state store.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorSeverity, Result, StoreError};
pub use types::{CircuitRecord, CircuitState, Namespace, Timestamp};
