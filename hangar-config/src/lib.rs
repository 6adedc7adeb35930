//! Shared configuration library for Hangar.
//!
//! Centralizes config models, defaults, file/env resolution and validation so
//! `hangarctl` and embedding services agree on a single source of truth.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{ConfigSource, HangarConfig, LoggingConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
