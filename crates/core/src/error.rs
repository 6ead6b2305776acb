//! Error types for the circuit state store
//!
//! Store errors are classified into two tiers:
//! - **Recoverable**: the store is temporarily unreachable or busy
//! - **Fatal**: the schema or data is broken and needs operator action
//!
//! The breaker never maps a store error onto an open or closed circuit. It
//! surfaces it to the caller so "dependency failed" and "breaker
//! infrastructure failed" stay distinguishable.

use std::fmt;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Requires operator intervention
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Errors raised by a circuit state store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached (connection, pool or I/O failure)
    #[error("State store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A query against the store failed
    #[error("State store query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persisted data violates the record invariants
    #[error("Circuit record corrupted: {details}")]
    Corrupted { details: String },

    /// Schema migration failed
    #[error("Migration failed: {version} - {reason}")]
    Migration { version: String, reason: String },

    /// In-process store lock was poisoned by a panicking writer
    #[error("State store lock poisoned")]
    LockPoisoned,

    /// Namespace is not a valid record identity
    #[error("Invalid namespace: {reason}")]
    InvalidNamespace { reason: String },
}

impl StoreError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable { .. } | Self::Query { .. } => ErrorSeverity::Recoverable,

            Self::Corrupted { .. }
            | Self::Migration { .. }
            | Self::LockPoisoned
            | Self::InvalidNamespace { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns true if the failed operation may succeed when retried
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }

    /// Helper to create an unavailable-store error from any error type
    pub fn unavailable<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a query error from any error type
    pub fn query<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a corrupted-record error
    pub fn corrupted(details: impl Into<String>) -> Self {
        Self::Corrupted {
            details: details.into(),
        }
    }
}

/// Convenience type alias for Results using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
