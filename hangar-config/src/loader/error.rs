use super::super::validation::ConfigGuardRailError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
}
