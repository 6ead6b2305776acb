//! Error types for guarded calls

use thiserror::Error;
use tripwire_core::StoreError;

/// Result type for guarded calls
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

/// Outcome of a guarded call that did not produce a value
///
/// Callers implementing fallbacks should match on `Open` (the breaker
/// refused the call) versus `Failed` (the dependency itself failed).
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Circuit is open; the protected work was not executed
    #[error("Circuit is open")]
    Open,

    /// The protected work failed; the original error, unchanged
    #[error(transparent)]
    Failed(E),

    /// The circuit state store could not be read or written
    ///
    /// `failure` holds the protected work's own error when the store failed
    /// while recording it.
    #[error("Circuit state store failed: {source}")]
    Store {
        #[source]
        source: StoreError,
        failure: Option<E>,
    },
}

impl<E> BreakerError<E> {
    pub(crate) fn store(source: StoreError) -> Self {
        Self::Store {
            source,
            failure: None,
        }
    }

    /// Returns true if the call was rejected by an open circuit
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the breaker's own store failed
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// Returns the protected work's error, if it ran and failed
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Store { failure, .. } => failure.as_ref(),
            Self::Open => None,
        }
    }

    /// Consumes the error, returning the protected work's error if any
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Store { failure, .. } => failure,
            Self::Open => None,
        }
    }
}
