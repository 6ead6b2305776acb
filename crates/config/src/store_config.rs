//! State store configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the shared circuit state database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file shared by every process using these circuits
    pub path: PathBuf,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Enable SQLite write-ahead logging
    pub enable_wal: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tripwire.db"),
            max_connections: 10,
            enable_wal: true,
        }
    }
}

impl ConfigSection for StoreSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();

        if self.path.as_os_str().is_empty() {
            results.push(Err(ValidationError::new("store.path", "must not be empty")));
        }

        results.push(Validator::in_range(
            self.max_connections,
            1,
            100,
            "store.max_connections",
        ));

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.path = other.path;
        self.max_connections = other.max_connections;
        self.enable_wal = other.enable_wal;
    }

    fn section_name(&self) -> &'static str {
        "store"
    }
}
