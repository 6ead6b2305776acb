//! Store-backed circuit state machine for one namespace

use std::time::Duration;
use tripwire_core::{CircuitRecord, CircuitState, Namespace, Result, Timestamp};
use tripwire_store::StateStore;

/// Circuit state for a single namespace
///
/// Holds no state of its own; every query and transition goes to the store,
/// so two `Circuit`s over the same store and namespace always agree.
#[derive(Debug, Clone)]
pub struct Circuit<S> {
    store: S,
    namespace: Namespace,
}

impl<S: StateStore> Circuit<S> {
    pub fn new(store: S, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the record, treating a missing one as a fresh closed circuit
    pub async fn read(&self) -> Result<CircuitRecord> {
        Ok(self
            .store
            .read_record(&self.namespace)
            .await?
            .unwrap_or_else(|| CircuitRecord::new(self.namespace.clone())))
    }

    /// Returns true while the close time lies in the future
    pub async fn is_open(&self) -> Result<bool> {
        Ok(self.read().await?.is_open_at(Timestamp::now()))
    }

    pub async fn state(&self) -> Result<CircuitState> {
        Ok(self.read().await?.state_at(Timestamp::now()))
    }

    /// Counts a watched failure and opens the circuit if the threshold is met
    ///
    /// The increment and the close-time write are separate atomic store
    /// operations. The close time is only written when the counter, as seen
    /// by the store at write time, has reached `threshold`.
    pub async fn record_failure(&self, threshold: u32, open_for: Duration) -> Result<()> {
        self.store.upsert_and_increment(&self.namespace).await?;

        let close_time = Timestamp::now().saturating_add(open_for);
        self.store
            .conditional_set_close_time(&self.namespace, close_time, u64::from(threshold))
            .await
    }

    /// Resets the consecutive-failure counter to zero
    ///
    /// The close time is left as is; an expired close time already reads as
    /// closed.
    pub async fn reset_failure(&self) -> Result<()> {
        self.store.upsert_counter(&self.namespace, 0).await
    }

    /// Returns the current counter, 0 if the namespace has no record
    pub async fn read_counter(&self) -> Result<u64> {
        Ok(self.read().await?.counter)
    }

    /// Returns the last close time written, if any
    pub async fn read_close_time(&self) -> Result<Option<Timestamp>> {
        Ok(self.read().await?.close_time)
    }
}
