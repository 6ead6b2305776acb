//! Tripwire Configuration System
//!
//! Configuration for circuit breakers and their shared state store, loaded
//! from a TOML file with environment variable overrides.
//!
//! # Architecture
//!
//! - **Trait-based**: Each section implements `ConfigSection`
//! - **Graceful degradation**: Invalid files are reported, missing files fall back to defaults
//! - **Atomic writes**: Saves go through a temp file and keep a `.backup`
//!
//! # Example
//!
//! ```rust,no_run
//! use tripwire_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("No config directory");
//! let config = manager.load_with_env_overrides().unwrap_or_default();
//!
//! println!("Threshold: {}", config.breaker.error_threshold);
//! ```

mod breaker_config;
mod error;
mod manager;
mod persistence;
mod store_config;
mod validation;

pub use breaker_config::BreakerSettings;
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{
    apply_env_overrides, ConfigManager, ENV_DATABASE, ENV_ERROR_THRESHOLD, ENV_ERROR_TIMEOUT_SECS,
    ENV_NAMESPACE,
};
pub use store_config::StoreSettings;
pub use validation::{ConfigSection, Validator};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Circuit breaker settings
    pub breaker: BreakerSettings,

    /// Shared state store settings
    pub store: StoreSettings,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.breaker.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.store.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.breaker.merge(other.breaker);
        self.store.merge(other.store);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            breaker: BreakerSettings::default(),
            store: StoreSettings::default(),
        }
    }
}
