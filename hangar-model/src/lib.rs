//! Core data model definitions shared across Hangar crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod installation;
pub mod status;

pub use error::ModelError;
pub use ids::{InstallationId, ServerId};
pub use installation::{Installation, InstallationUpdate};
pub use status::{InstallationStatus, StatusAction};
