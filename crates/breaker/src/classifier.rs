//! Classification of protected-call failures

use std::collections::BTreeSet;
use std::io;

/// Kind answered by every timeout failure
pub const TIMEOUT: &str = "timeout";

/// Kind answered by refused, reset or aborted connections
pub const CONNECTION: &str = "connection";

/// Kind answered by every `std::io::Error`
pub const IO: &str = "io";

/// A failure that can be matched against watched kind tags
///
/// A failure answers to its own tag and to every broader tag it belongs
/// to. A connect timeout, for example, may answer to both
/// `"connect_timeout"` and `"timeout"`.
pub trait FailureKind: std::error::Error {
    /// Returns true if this failure belongs to `kind`
    fn is_kind(&self, kind: &str) -> bool;
}

impl FailureKind for io::Error {
    fn is_kind(&self, kind: &str) -> bool {
        match kind {
            IO => true,
            TIMEOUT => self.kind() == io::ErrorKind::TimedOut,
            CONNECTION => matches!(
                self.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

impl FailureKind for tokio::time::error::Elapsed {
    fn is_kind(&self, kind: &str) -> bool {
        kind == TIMEOUT
    }
}

/// Whether a failure counts toward opening the circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Counts toward the threshold
    Watched,
    /// Resets the counter like a success
    Unwatched,
}

/// Set of failure kinds that count toward opening a circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFailures {
    kinds: BTreeSet<String>,
}

impl WatchedFailures {
    /// Creates a set watching the given kinds
    pub fn new<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a set that watches nothing
    pub fn none() -> Self {
        Self {
            kinds: BTreeSet::new(),
        }
    }

    /// Adds a kind to the set
    pub fn watch(mut self, kind: impl Into<String>) -> Self {
        self.kinds.insert(kind.into());
        self
    }

    /// Returns true if `kind` is watched
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Iterates the watched kinds in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }

    /// Classifies a failure against this set
    pub fn classify<E: FailureKind + ?Sized>(&self, failure: &E) -> Classification {
        if self.kinds.iter().any(|kind| failure.is_kind(kind)) {
            Classification::Watched
        } else {
            Classification::Unwatched
        }
    }
}

impl Default for WatchedFailures {
    fn default() -> Self {
        Self::new([TIMEOUT])
    }
}
