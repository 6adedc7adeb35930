//! Persistence ports and the bundled in-memory store.

pub mod memory;
pub mod ports;

pub use memory::InMemoryInstallationStore;
pub use ports::{InstallationPatch, InstallationRepository, StatusStore};
