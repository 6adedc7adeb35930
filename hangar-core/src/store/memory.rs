use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hangar_model::{Installation, InstallationId, InstallationStatus, ServerId};
use tokio::sync::RwLock;

use super::ports::{InstallationPatch, InstallationRepository, StatusStore};
use crate::error::{HangarError, Result};

/// Process-local installation store backed by a map.
#[derive(Clone, Default)]
pub struct InMemoryInstallationStore {
    records: Arc<RwLock<HashMap<InstallationId, Installation>>>,
}

impl fmt::Debug for InMemoryInstallationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("InMemoryInstallationStore");
        match self.records.try_read() {
            Ok(records) => {
                debug.field("record_count", &records.len());
            }
            Err(_) => {
                debug.field("records", &"<locked>");
            }
        }
        debug.finish()
    }
}

impl InMemoryInstallationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record without going through the create path.
    pub async fn seed(&self, installation: Installation) {
        let mut records = self.records.write().await;
        records.insert(installation.id.clone(), installation);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StatusStore for InMemoryInstallationStore {
    async fn read_status(
        &self,
        id: &InstallationId,
    ) -> Result<Option<InstallationStatus>> {
        let records = self.records.read().await;
        Ok(records.get(id).map(|installation| installation.status))
    }

    async fn write_status(
        &self,
        id: &InstallationId,
        status: InstallationStatus,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let installation = records
            .get_mut(id)
            .ok_or_else(|| HangarError::NotFound(id.to_string()))?;
        installation.status = status;
        Ok(())
    }
}

#[async_trait]
impl InstallationRepository for InMemoryInstallationStore {
    async fn create_installation(&self, installation: Installation) -> Result<Installation> {
        let mut records = self.records.write().await;
        if records.contains_key(&installation.id) {
            return Err(HangarError::InvalidInput(format!(
                "installation {} already exists",
                installation.id
            )));
        }
        records.insert(installation.id.clone(), installation.clone());
        Ok(installation)
    }

    async fn get_installation(
        &self,
        id: &InstallationId,
    ) -> Result<Option<Installation>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn find_by_server(
        &self,
        server_id: &ServerId,
    ) -> Result<Option<Installation>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|installation| &installation.server_id == server_id)
            .cloned())
    }

    async fn list_installations(
        &self,
        server_id: Option<&ServerId>,
    ) -> Result<Vec<Installation>> {
        let records = self.records.read().await;
        let mut installations: Vec<Installation> = records
            .values()
            .filter(|installation| {
                server_id.is_none_or(|server| &installation.server_id == server)
            })
            .cloned()
            .collect();
        installations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(installations)
    }

    async fn update_installation(
        &self,
        id: &InstallationId,
        patch: InstallationPatch,
    ) -> Result<Installation> {
        let mut records = self.records.write().await;
        let installation = records
            .get_mut(id)
            .ok_or_else(|| HangarError::NotFound(id.to_string()))?;

        if let Some(status) = patch.status {
            installation.status = status;
        }
        if let Some(last_ping) = patch.last_ping {
            installation.last_ping = Some(last_ping);
        }
        if let Some(config) = patch.config {
            installation.config = config;
        }

        Ok(installation.clone())
    }

    async fn delete_installation(&self, id: &InstallationId) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HangarError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: &str, server: &str) -> Installation {
        Installation::pending(ServerId::from(server)).with_id(InstallationId::from(id))
    }

    #[tokio::test]
    async fn read_status_reports_missing_records_as_none() {
        let store = InMemoryInstallationStore::new();
        let status = store
            .read_status(&InstallationId::from("ghost"))
            .await
            .expect("read succeeds");
        assert_eq!(status, None);
    }

    #[tokio::test]
    async fn write_status_requires_existing_record() {
        let store = InMemoryInstallationStore::new();
        let err = store
            .write_status(&InstallationId::from("ghost"), InstallationStatus::Running)
            .await
            .expect_err("unknown id must fail");
        assert!(matches!(err, HangarError::NotFound(_)));

        store.seed(pending("install-1", "filesystem")).await;
        store
            .write_status(&InstallationId::from("install-1"), InstallationStatus::Installing)
            .await
            .expect("write succeeds");
        assert_eq!(
            store
                .read_status(&InstallationId::from("install-1"))
                .await
                .expect("read succeeds"),
            Some(InstallationStatus::Installing)
        );
    }

    #[tokio::test]
    async fn list_filters_by_server_and_orders_newest_first() {
        let store = InMemoryInstallationStore::new();
        let mut older = pending("a", "filesystem");
        older.created_at -= chrono::Duration::seconds(30);
        store.create_installation(older).await.expect("create a");
        store
            .create_installation(pending("b", "filesystem"))
            .await
            .expect("create b");
        store
            .create_installation(pending("c", "github"))
            .await
            .expect("create c");

        let all = store.list_installations(None).await.expect("list all");
        assert_eq!(all.len(), 3);
        assert_eq!(all.last().map(|i| i.id.as_str()), Some("a"));

        let filesystem = store
            .list_installations(Some(&ServerId::from("filesystem")))
            .await
            .expect("list filtered");
        let ids: Vec<_> = filesystem.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let store = InMemoryInstallationStore::new();
        store
            .create_installation(pending("dup", "filesystem"))
            .await
            .expect("first create");
        let err = store
            .create_installation(pending("dup", "filesystem"))
            .await
            .expect_err("duplicate create must fail");
        assert!(matches!(err, HangarError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryInstallationStore::new();
        store.seed(pending("gone", "filesystem")).await;
        store
            .delete_installation(&InstallationId::from("gone"))
            .await
            .expect("delete succeeds");
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete_installation(&InstallationId::from("gone")).await,
            Err(HangarError::NotFound(_))
        ));
    }
}
