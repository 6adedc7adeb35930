use thiserror::Error;

use super::models::HangarConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("lifecycle.{field} must be greater than zero")]
    ZeroDelay { field: &'static str },
    #[error("logging.filter must not be empty")]
    EmptyLogFilter,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Reject configurations the simulator cannot run with and collect
/// warnings for the ones that merely look odd.
pub fn apply_guard_rails(
    config: &HangarConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let lifecycle = &config.lifecycle;
    if lifecycle.pending_delay_ms == 0 {
        return Err(ConfigGuardRailError::ZeroDelay {
            field: "pending_delay_ms",
        });
    }
    if lifecycle.installing_delay_ms == 0 {
        return Err(ConfigGuardRailError::ZeroDelay {
            field: "installing_delay_ms",
        });
    }
    if config.logging.filter.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyLogFilter);
    }

    let mut warnings = ConfigWarnings::default();
    if lifecycle.jitter_max_ms == 0 {
        warnings.push_with_hint(
            "lifecycle jitter is disabled",
            "installations created together will change status in lockstep",
        );
    }
    if lifecycle.jitter_max_ms > lifecycle.pending_delay_ms {
        warnings.push(format!(
            "lifecycle.jitter_max_ms ({}) exceeds pending_delay_ms ({})",
            lifecycle.jitter_max_ms, lifecycle.pending_delay_ms
        ));
    }

    Ok(warnings)
}
