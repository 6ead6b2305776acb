//! Circuit breaker configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the consecutive-failure threshold
const MAX_ERROR_THRESHOLD: u32 = 1_000_000;

/// Upper bound on how long a circuit stays open (one week)
const MAX_ERROR_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Settings for a circuit breaker guard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BreakerSettings {
    /// Circuits sharing a namespace share state
    pub namespace: String,

    /// Failure kinds that count toward opening the circuit
    pub watched_kinds: Vec<String>,

    /// Consecutive watched failures that open the circuit
    pub error_threshold: u32,

    /// Seconds the circuit stays open once tripped
    pub error_timeout_secs: u64,
}

impl BreakerSettings {
    /// Returns the open duration
    pub fn error_timeout(&self) -> Duration {
        Duration::from_secs(self.error_timeout_secs)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            watched_kinds: vec!["timeout".to_string()],
            error_threshold: 10,
            error_timeout_secs: 60,
        }
    }
}

impl ConfigSection for BreakerSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::not_empty(&self.namespace, "breaker.namespace"),
            Validator::non_empty_list(&self.watched_kinds, "breaker.watched_kinds"),
            Validator::in_range(
                self.error_threshold,
                1,
                MAX_ERROR_THRESHOLD,
                "breaker.error_threshold",
            ),
            Validator::in_range(
                self.error_timeout_secs,
                1,
                MAX_ERROR_TIMEOUT_SECS,
                "breaker.error_timeout_secs",
            ),
        ];

        for (i, kind) in self.watched_kinds.iter().enumerate() {
            results.push(Validator::not_empty(
                kind,
                &format!("breaker.watched_kinds[{}]", i),
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.namespace = other.namespace;
        self.watched_kinds = other.watched_kinds;
        self.error_threshold = other.error_threshold;
        self.error_timeout_secs = other.error_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "breaker"
    }
}
