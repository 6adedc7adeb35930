use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs for the simulated install pipeline.
///
/// All fields carry defaults so partial configuration payloads only need to
/// name the values they override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Base delay (ms) before a `PENDING` installation moves to `INSTALLING`.
    pub pending_delay_ms: u64,
    /// Base delay (ms) before an `INSTALLING` installation moves to `RUNNING`.
    pub installing_delay_ms: u64,
    /// Exclusive upper bound (ms) of the random delay added to every hop.
    /// Zero disables jitter.
    pub jitter_max_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pending_delay_ms: 5_000,
            installing_delay_ms: 10_000,
            jitter_max_ms: 2_000,
        }
    }
}

impl LifecycleConfig {
    pub fn pending_delay(&self) -> Duration {
        Duration::from_millis(self.pending_delay_ms)
    }

    pub fn installing_delay(&self) -> Duration {
        Duration::from_millis(self.installing_delay_ms)
    }

    /// Copy of this config with jitter turned off.
    pub fn without_jitter(mut self) -> Self {
        self.jitter_max_ms = 0;
        self
    }
}
