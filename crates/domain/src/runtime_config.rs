// =============================================================================
// RuntimeConfigState / RuntimeConfigCell — the hot-swappable config cell
// =============================================================================
//
// Every stage that needs thresholds, risk limits, or the global kill switch
// holds one `RuntimeConfigCell`. It starts from an HTTP bootstrap fetch
// against the config service and is thereafter replaced wholesale whenever a
// `config:updates` pub/sub message arrives — never patched field-by-field, so
// readers never observe a torn mix of old and new values.
// =============================================================================

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigProfile, RiskLimits, Thresholds};

/// The subset of a [`ConfigProfile`] that every stage needs on its hot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfigState {
    pub version: i32,
    pub thresholds: Thresholds,
    pub risk_limits: RiskLimits,
    pub global_enable: bool,
    pub scan_interval_seconds: f64,
    pub close_interval_seconds: f64,
    pub open_interval_seconds: f64,
}

impl Default for RuntimeConfigState {
    fn default() -> Self {
        Self {
            version: 0,
            thresholds: Thresholds::default(),
            risk_limits: RiskLimits::default(),
            global_enable: true,
            scan_interval_seconds: 10.0,
            close_interval_seconds: 10.0,
            open_interval_seconds: 5.0,
        }
    }
}

impl From<&ConfigProfile> for RuntimeConfigState {
    fn from(profile: &ConfigProfile) -> Self {
        Self {
            version: profile.version,
            thresholds: profile.thresholds,
            risk_limits: profile.risk_limits,
            global_enable: profile.global_enable,
            scan_interval_seconds: profile.scan_interval_seconds,
            close_interval_seconds: profile.close_interval_seconds,
            open_interval_seconds: profile.open_interval_seconds,
        }
    }
}

/// Process-wide holder for the current [`RuntimeConfigState`].
///
/// Reads are lock-free from the caller's perspective (a single `RwLock::read`
/// plus a clone of a small `Copy`-heavy struct); writes replace the entire
/// structure under one write-lock acquisition.
pub struct RuntimeConfigCell {
    inner: RwLock<RuntimeConfigState>,
}

impl RuntimeConfigCell {
    pub fn new(initial: RuntimeConfigState) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Read the current state. Cheap: clones a handful of `f64`/`u32` fields.
    pub fn get(&self) -> RuntimeConfigState {
        self.inner.read().clone()
    }

    /// Replace the entire state. Ignores an update whose `version` is not
    /// newer than what is already held, since pub/sub delivery has no
    /// ordering guarantee across reconnects.
    pub fn set(&self, new_state: RuntimeConfigState) {
        let mut guard = self.inner.write();
        if new_state.version < guard.version {
            return;
        }
        info!(
            old_version = guard.version,
            new_version = new_state.version,
            "runtime config replaced"
        );
        *guard = new_state;
    }
}

impl Default for RuntimeConfigCell {
    fn default() -> Self {
        Self::new(RuntimeConfigState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_whole_structure() {
        let cell = RuntimeConfigCell::new(RuntimeConfigState::default());
        let mut next = cell.get();
        next.version = 2;
        next.global_enable = false;
        next.thresholds.aa = 0.001;
        cell.set(next.clone());

        let read_back = cell.get();
        assert_eq!(read_back, next);
        assert!(!read_back.global_enable);
    }

    #[test]
    fn set_ignores_stale_version() {
        let cell = RuntimeConfigCell::new(RuntimeConfigState {
            version: 5,
            ..RuntimeConfigState::default()
        });
        let mut stale = cell.get();
        stale.version = 3;
        stale.global_enable = false;
        cell.set(stale);

        assert_eq!(cell.get().version, 5);
        assert!(cell.get().global_enable);
    }
}
