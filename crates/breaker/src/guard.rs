// crates/breaker/src/guard.rs
//! The breaker guard wrapping protected calls

use crate::circuit::Circuit;
use crate::classifier::{Classification, FailureKind, WatchedFailures};
use crate::error::{BreakerError, BreakerResult};
use crate::kill_switch::KillSwitch;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tripwire_config::{
    BreakerSettings, ConfigError, ConfigResult, ConfigSection, ValidationError,
};
use tripwire_core::{CircuitState, Namespace, Result, Timestamp};
use tripwire_store::StateStore;

/// Notification callback shared by every clone of a breaker
pub type Callback = Arc<dyn Fn(&BreakerEvent<'_>) + Send + Sync>;

/// Event passed to the notification callback
#[derive(Debug)]
pub enum BreakerEvent<'a> {
    /// A watched failure was recorded; downcast to recover the concrete error
    Failure(&'a (dyn Error + 'static)),
    /// A call was rejected because the circuit is open
    CircuitOpen,
}

/// Per-guard configuration, never persisted
#[derive(Clone)]
pub struct BreakerConfig {
    namespace: Namespace,
    watched: WatchedFailures,
    error_threshold: u32,
    error_timeout: Duration,
    callback: Option<Callback>,
    kill_switch: KillSwitch,
}

impl BreakerConfig {
    /// Creates a configuration for `namespace` with default settings
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            ..Self::default()
        }
    }

    /// Builds a configuration from a loaded settings section
    ///
    /// The kill switch reads the `TRIPWIRE` environment variable.
    pub fn from_settings(settings: &BreakerSettings) -> ConfigResult<Self> {
        settings.validate().map_err(ConfigError::Invalid)?;

        let namespace = Namespace::new(settings.namespace.clone()).map_err(|e| {
            ConfigError::Invalid(vec![ValidationError::new("breaker.namespace", e.to_string())])
        })?;

        Ok(Self::new(namespace)
            .with_watched(WatchedFailures::new(settings.watched_kinds.iter().cloned()))
            .with_error_threshold(settings.error_threshold)
            .with_error_timeout(settings.error_timeout()))
    }

    pub fn with_watched(mut self, watched: WatchedFailures) -> Self {
        self.watched = watched;
        self
    }

    /// Sets the consecutive-failure threshold; 0 is treated as 1
    pub fn with_error_threshold(mut self, threshold: u32) -> Self {
        self.error_threshold = threshold.max(1);
        self
    }

    /// Sets how long the circuit stays open once tripped
    pub fn with_error_timeout(mut self, timeout: Duration) -> Self {
        self.error_timeout = timeout;
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BreakerEvent<'_>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn with_kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn watched(&self) -> &WatchedFailures {
        &self.watched
    }

    pub fn error_threshold(&self) -> u32 {
        self.error_threshold
    }

    pub fn error_timeout(&self) -> Duration {
        self.error_timeout
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            watched: WatchedFailures::default(),
            error_threshold: 10,
            error_timeout: Duration::from_secs(60),
            callback: None,
            kill_switch: KillSwitch::from_env(),
        }
    }
}

impl fmt::Debug for BreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerConfig")
            .field("namespace", &self.namespace)
            .field("watched", &self.watched)
            .field("error_threshold", &self.error_threshold)
            .field("error_timeout", &self.error_timeout)
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .field("kill_switch", &self.kill_switch)
            .finish()
    }
}

/// Circuit breaker guarding calls to one dependency
///
/// Cloning is cheap when the store is; clones share the callback and
/// kill switch.
#[derive(Debug, Clone)]
pub struct Breaker<S> {
    circuit: Circuit<S>,
    config: BreakerConfig,
}

impl<S: StateStore> Breaker<S> {
    pub fn new(store: S, config: BreakerConfig) -> Self {
        Self {
            circuit: Circuit::new(store, config.namespace.clone()),
            config,
        }
    }

    /// Runs `work` under the breaker
    ///
    /// Returns `BreakerError::Open` without calling `work` while the circuit
    /// is open. Failures from `work` come back as `BreakerError::Failed`
    /// after the counter has been updated.
    pub async fn run<T, E, F, Fut>(&self, work: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: FailureKind + 'static,
    {
        let namespace = self.circuit.namespace();

        if self.config.kill_switch.is_engaged() {
            log::debug!("Kill switch engaged, bypassing circuit '{}'", namespace);
            return work().await.map_err(BreakerError::Failed);
        }

        if self.circuit.is_open().await.map_err(BreakerError::store)? {
            log::info!("Circuit '{}' is open, rejecting call", namespace);
            self.notify(&BreakerEvent::CircuitOpen);
            return Err(BreakerError::Open);
        }

        let failure = match work().await {
            Ok(value) => {
                self.circuit
                    .reset_failure()
                    .await
                    .map_err(BreakerError::store)?;
                return Ok(value);
            }
            Err(failure) => failure,
        };

        let bookkeeping = match self.config.watched.classify(&failure) {
            Classification::Watched => {
                log::debug!("Recording watched failure on circuit '{}'", namespace);
                let recorded = self
                    .circuit
                    .record_failure(self.config.error_threshold, self.config.error_timeout)
                    .await;
                self.notify(&BreakerEvent::Failure(&failure));
                recorded
            }
            Classification::Unwatched => {
                log::debug!("Unwatched failure resets circuit '{}'", namespace);
                self.circuit.reset_failure().await
            }
        };

        match bookkeeping {
            Ok(()) => Err(BreakerError::Failed(failure)),
            Err(source) => Err(BreakerError::Store {
                source,
                failure: Some(failure),
            }),
        }
    }

    fn notify(&self, event: &BreakerEvent<'_>) {
        if let Some(callback) = &self.config.callback {
            callback(event);
        }
    }

    /// Reads the store; the kill switch does not affect accessors
    pub async fn is_open(&self) -> Result<bool> {
        self.circuit.is_open().await
    }

    pub async fn state(&self) -> Result<CircuitState> {
        self.circuit.state().await
    }

    /// Current consecutive watched-failure count
    pub async fn counter(&self) -> Result<u64> {
        self.circuit.read_counter().await
    }

    pub async fn close_time(&self) -> Result<Option<Timestamp>> {
        self.circuit.read_close_time().await
    }

    pub fn namespace(&self) -> &Namespace {
        self.circuit.namespace()
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Replaces the notification callback
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(&BreakerEvent<'_>) + Send + Sync + 'static,
    {
        self.config.callback = Some(Arc::new(callback));
    }
}
