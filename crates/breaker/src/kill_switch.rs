//! Global bypass for every breaker sharing a switch

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Environment variable read by [`KillSwitch::from_env`]
pub const KILL_SWITCH_VAR: &str = "TRIPWIRE";

/// Decides whether breakers are bypassed entirely
///
/// While engaged, guarded calls run the protected work directly with no
/// store reads or writes and no callback invocations.
#[derive(Debug, Clone)]
pub enum KillSwitch {
    /// Engaged while the named variable equals `off`, case-insensitively
    Env(String),
    /// Engaged through a [`KillSwitchHandle`]
    Manual(Arc<AtomicBool>),
    /// Never engaged
    Disabled,
}

impl KillSwitch {
    /// Switch driven by the `TRIPWIRE` environment variable
    pub fn from_env() -> Self {
        Self::env(KILL_SWITCH_VAR)
    }

    /// Switch driven by a custom environment variable
    pub fn env(var: impl Into<String>) -> Self {
        Self::Env(var.into())
    }

    /// Switch flipped at runtime through the returned handle
    pub fn manual() -> (Self, KillSwitchHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self::Manual(Arc::clone(&flag)),
            KillSwitchHandle { flag },
        )
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Returns true if breakers should be bypassed right now
    ///
    /// Evaluated on every call, so changes take effect immediately.
    pub fn is_engaged(&self) -> bool {
        match self {
            Self::Env(var) => std::env::var(var)
                .map(|value| value.trim().eq_ignore_ascii_case("off"))
                .unwrap_or(false),
            Self::Manual(flag) => flag.load(Ordering::SeqCst),
            Self::Disabled => false,
        }
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Handle controlling a manual [`KillSwitch`] and all its clones
#[derive(Debug, Clone)]
pub struct KillSwitchHandle {
    flag: Arc<AtomicBool>,
}

impl KillSwitchHandle {
    /// Bypasses every breaker using this switch
    pub fn engage(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_engaged(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
