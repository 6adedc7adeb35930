//! Configuration resolution.
//!
//! Evaluation order:
//! 1) `$HANGAR_CONFIG_PATH` (TOML or JSON file),
//! 2) `$HANGAR_CONFIG_JSON` (inline JSON),
//! 3) the first existing default file under the base directory,
//! 4) built-in defaults.

pub mod error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ConfigSource, HangarConfig};
use crate::validation::{ConfigWarnings, apply_guard_rails};
use error::ConfigLoadError;

pub const CONFIG_PATH_ENV: &str = "HANGAR_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "HANGAR_CONFIG_JSON";

const DEFAULT_CANDIDATES: &[&str] = &[
    "hangar.toml",
    "hangar.json",
    "config/hangar.toml",
    "config/hangar.json",
];

/// Fully resolved configuration plus how it was obtained.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: HangarConfig,
    pub source: ConfigSource,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env: HashMap<String, String>,
    base_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment and the working directory.
    pub fn new() -> Self {
        let env = [CONFIG_PATH_ENV, CONFIG_JSON_ENV]
            .into_iter()
            .filter_map(|key| {
                std::env::var(key).ok().map(|value| (key.to_string(), value))
            })
            .collect();
        Self {
            env,
            base_dir: PathBuf::from("."),
        }
    }

    /// Loader with an explicit environment, for embedding and tests.
    pub fn with_env<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory searched for default config files.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (config, source) = self.resolve()?;
        let warnings = apply_guard_rails(&config)?;
        for warning in &warnings.items {
            tracing::warn!(target: "config", hint = ?warning.hint, "{}", warning.message);
        }
        Ok(ConfigLoad {
            config,
            source,
            warnings,
        })
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn resolve(&self) -> Result<(HangarConfig, ConfigSource), ConfigLoadError> {
        if let Some(path) = self.env_value(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = self.env_value(CONFIG_JSON_ENV) {
            let config = parse_json(raw, CONFIG_JSON_ENV)?;
            return Ok((config, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((HangarConfig::default(), ConfigSource::Default))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_CANDIDATES
            .iter()
            .map(|candidate| self.base_dir.join(candidate))
            .find(|path| path.exists())
    }
}

pub fn load_from_file(path: &Path) -> Result<HangarConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents, &origin),
        Some("toml") | Some("tml") => parse_toml(&contents, &origin),
        _ => parse_from_str(&contents, &origin),
    }
}

/// Try TOML first, then JSON.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> Result<HangarConfig, ConfigLoadError> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            ConfigLoadError::Parse {
                origin: origin.to_string(),
                message: format!(
                    "toml error: {toml_err}; json error: {json_err}"
                ),
            }
        })
    })
}

fn parse_toml(
    contents: &str,
    origin: &str,
) -> Result<HangarConfig, ConfigLoadError> {
    toml::from_str(contents).map_err(|err| ConfigLoadError::Parse {
        origin: origin.to_string(),
        message: err.to_string(),
    })
}

fn parse_json(raw: &str, origin: &str) -> Result<HangarConfig, ConfigLoadError> {
    serde_json::from_str(raw).map_err(|err| ConfigLoadError::Parse {
        origin: origin.to_string(),
        message: err.to_string(),
    })
}
