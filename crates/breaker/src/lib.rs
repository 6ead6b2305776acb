//! Circuit breaker with state shared through a store
//!
//! A [`Breaker`] wraps calls to an unreliable dependency. Consecutive
//! watched failures are counted in a [`StateStore`]; once the count reaches
//! the threshold the circuit opens and further calls fail fast with
//! [`BreakerError::Open`] until the open duration elapses. Every breaker
//! pointing at the same namespace in the same store, in this process or
//! another, shares one counter and one open/closed state.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tripwire_breaker::{Breaker, BreakerConfig, BreakerError, WatchedFailures};
//! use tripwire_core::Namespace;
//! use tripwire_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = BreakerConfig::new(Namespace::new("inventory").unwrap())
//!     .with_watched(WatchedFailures::new(["timeout"]))
//!     .with_error_threshold(5)
//!     .with_error_timeout(Duration::from_secs(30));
//! let breaker = Breaker::new(MemoryStore::new(), config);
//!
//! let result = breaker
//!     .run(|| async { Ok::<_, std::io::Error>("stock level") })
//!     .await;
//!
//! match result {
//!     Ok(value) => assert_eq!(value, "stock level"),
//!     Err(BreakerError::Open) => { /* serve a fallback */ }
//!     Err(other) => panic!("{}", other),
//! }
//! # }
//! ```
//!
//! [`StateStore`]: tripwire_store::StateStore

mod circuit;
mod classifier;
mod error;
mod guard;
mod kill_switch;

pub use circuit::Circuit;
pub use classifier::{Classification, FailureKind, WatchedFailures, CONNECTION, IO, TIMEOUT};
pub use error::{BreakerError, BreakerResult};
pub use guard::{Breaker, BreakerConfig, BreakerEvent, Callback};
pub use kill_switch::{KillSwitch, KillSwitchHandle, KILL_SWITCH_VAR};
