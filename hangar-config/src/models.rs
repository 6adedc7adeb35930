use std::path::PathBuf;

use hangar_core::LifecycleConfig;
use serde::{Deserialize, Serialize};

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("built-in defaults"),
            ConfigSource::EnvPath(path) => {
                write!(f, "{} (HANGAR_CONFIG_PATH)", path.display())
            }
            ConfigSource::EnvInline => f.write_str("HANGAR_CONFIG_JSON"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Top-level Hangar settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HangarConfig {
    /// Hop delays and jitter for the installation lifecycle simulator.
    /// Shorten the delays for demos; keep some jitter when many
    /// installations are created at once.
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

/// Tracing output settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string used when `RUST_LOG` is absent.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,lifecycle::hop=warn".to_string(),
        }
    }
}
