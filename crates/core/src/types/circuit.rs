//! Circuit identity and persisted state

use crate::error::StoreError;
use crate::types::Timestamp;
use std::fmt;
use std::str::FromStr;

/// Shared identity of a circuit
///
/// Circuits constructed with the same namespace against the same store
/// share one counter and one open/closed state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Name used when none is configured
    pub const DEFAULT: &'static str = "default";

    /// Creates a namespace, rejecting empty or whitespace-only names
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoreError::InvalidNamespace {
                reason: "namespace must not be empty".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// Returns the namespace as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Namespace {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// Open/closed state of a circuit, derived from its close time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow through to the protected dependency
    Closed,
    /// Calls are rejected until the close time passes
    Open,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Persisted circuit state, one per namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitRecord {
    pub namespace: Namespace,
    /// Consecutive watched failures since the last reset
    pub counter: u64,
    /// Circuit is open while this lies in the future
    pub close_time: Option<Timestamp>,
}

impl CircuitRecord {
    /// Creates a fresh, closed record
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            counter: 0,
            close_time: None,
        }
    }

    /// Returns true if the close time lies strictly after `now`
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.close_time.is_some_and(|close| close > now)
    }

    /// Returns the state as seen at `now`
    pub fn state_at(&self, now: Timestamp) -> CircuitState {
        if self.is_open_at(now) {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }
}
