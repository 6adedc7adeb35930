use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hangar_model::{Installation, InstallationId, InstallationStatus, ServerId};

use crate::error::Result;

/// Status primitives the lifecycle scheduler needs from persistence.
///
/// Implementations provide read-modify-write access only; the scheduler
/// re-validates with [`StatusStore::read_status`] before every write instead of
/// relying on store-side locking.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Current status, or `None` when the record does not exist.
    async fn read_status(
        &self,
        id: &InstallationId,
    ) -> Result<Option<InstallationStatus>>;

    /// Overwrite the status. Fails with `NotFound` for unknown ids.
    async fn write_status(
        &self,
        id: &InstallationId,
        status: InstallationStatus,
    ) -> Result<()>;
}

/// Field changes applied through [`InstallationRepository::update_installation`].
#[derive(Debug, Clone, Default)]
pub struct InstallationPatch {
    pub status: Option<InstallationStatus>,
    pub last_ping: Option<DateTime<Utc>>,
    pub config: Option<serde_json::Value>,
}

/// Full record access used by the installation service.
#[async_trait]
pub trait InstallationRepository: StatusStore {
    async fn create_installation(&self, installation: Installation) -> Result<Installation>;

    async fn get_installation(
        &self,
        id: &InstallationId,
    ) -> Result<Option<Installation>>;

    async fn find_by_server(
        &self,
        server_id: &ServerId,
    ) -> Result<Option<Installation>>;

    /// Installations ordered newest first, optionally narrowed to one server.
    async fn list_installations(
        &self,
        server_id: Option<&ServerId>,
    ) -> Result<Vec<Installation>>;

    async fn update_installation(
        &self,
        id: &InstallationId,
        patch: InstallationPatch,
    ) -> Result<Installation>;

    async fn delete_installation(&self, id: &InstallationId) -> Result<()>;
}
