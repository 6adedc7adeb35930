//! # Hangar Core
//!
//! Core library for Hangar, the MCP server installation registry. It owns the
//! storage ports for installation records and the lifecycle simulator that
//! animates a freshly created installation from `PENDING` through
//! `INSTALLING` to `RUNNING`.
//!
//! ## Architecture
//!
//! - [`store`]: the [`StatusStore`] primitives the simulator needs, the fuller
//!   [`InstallationRepository`] port, and an in-memory implementation.
//! - [`lifecycle`]: the hop table, jitter sources and the
//!   [`LifecycleScheduler`] timer registry.
//! - [`installations`]: the install / update / uninstall flows that call into
//!   the scheduler.
//! - [`health`]: simulated health metrics and logs for an installation.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hangar_core::{InMemoryInstallationStore, InstallationService, LifecycleConfig};
//! use hangar_model::ServerId;
//!
//! async fn install_filesystem() -> hangar_core::Result<()> {
//!     let store = Arc::new(InMemoryInstallationStore::new());
//!     let service = InstallationService::new(store, LifecycleConfig::default());
//!
//!     let outcome = service.install(ServerId::from("filesystem")).await?;
//!     println!("{} is {}", outcome.installation.id, outcome.installation.status);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod error;
pub mod health;
pub mod installations;
pub mod lifecycle;
pub mod store;

pub use error::{HangarError, Result};
pub use health::{
    DEFAULT_HEALTH_LOG_COUNT, HealthLog, HealthMetrics, HealthStatus, LogLevel,
};
pub use installations::{ActiveSimulations, InstallOutcome, InstallationService};
pub use lifecycle::{
    FixedJitter, Hop, HopOutcome, JitterSource, LifecycleConfig, LifecycleScheduler,
    StopReason, UniformJitter,
};
pub use store::{
    InMemoryInstallationStore, InstallationPatch, InstallationRepository, StatusStore,
};
