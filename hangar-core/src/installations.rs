//! Installation service: the caller-side flows that create, mutate and
//! remove installation records and keep the lifecycle simulator in step.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use hangar_model::{
    Installation, InstallationId, InstallationStatus, InstallationUpdate, ServerId,
    StatusAction,
};
use serde::Serialize;

use crate::error::{HangarError, Result};
use crate::health::{self, HealthLog, HealthMetrics};
use crate::lifecycle::{LifecycleConfig, LifecycleScheduler};
use crate::store::{InstallationPatch, InstallationRepository};

/// Result of [`InstallationService::install`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOutcome {
    /// `true` when the server already had an installation and nothing was
    /// created.
    pub already_installed: bool,
    pub installation: Installation,
}

/// Diagnostics snapshot of installations with a live simulation timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSimulations {
    pub count: usize,
    pub installations: Vec<InstallationId>,
}

pub struct InstallationService<R> {
    repository: Arc<R>,
    scheduler: LifecycleScheduler,
}

impl<R> Clone for InstallationService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<R> fmt::Debug for InstallationService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationService")
            .field("repository_type", &std::any::type_name::<R>())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl<R> InstallationService<R>
where
    R: InstallationRepository + 'static,
{
    /// Service with its own scheduler writing to `repository`. Must be called
    /// inside a tokio runtime, see [`LifecycleScheduler::new`].
    pub fn new(repository: Arc<R>, config: LifecycleConfig) -> Self {
        let scheduler = LifecycleScheduler::new(repository.clone(), config);
        Self::with_scheduler(repository, scheduler)
    }

    /// Service sharing an existing scheduler. The scheduler must write to the
    /// same store as `repository`.
    pub fn with_scheduler(repository: Arc<R>, scheduler: LifecycleScheduler) -> Self {
        Self {
            repository,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &LifecycleScheduler {
        &self.scheduler
    }

    /// Create a `PENDING` installation for `server_id` and start its
    /// simulated install, unless the server is already installed.
    pub async fn install(&self, server_id: ServerId) -> Result<InstallOutcome> {
        if let Some(existing) = self.repository.find_by_server(&server_id).await? {
            return Ok(InstallOutcome {
                already_installed: true,
                installation: existing,
            });
        }

        let created = self
            .repository
            .create_installation(Installation::pending(server_id))
            .await?;

        self.scheduler.start(created.id.clone());
        tracing::info!(
            target: "installations",
            installation_id = %created.id,
            server_id = %created.server_id,
            "installation created"
        );

        Ok(InstallOutcome {
            already_installed: false,
            installation: created,
        })
    }

    pub async fn list(&self, server_id: Option<&ServerId>) -> Result<Vec<Installation>> {
        self.repository.list_installations(server_id).await
    }

    pub async fn get(&self, id: &InstallationId) -> Result<Installation> {
        self.repository
            .get_installation(id)
            .await?
            .ok_or_else(|| HangarError::NotFound(id.to_string()))
    }

    /// Apply a direct status and/or config change.
    ///
    /// Writing `RUNNING` refreshes `last_ping`. Writing `STOPPED` or `ERROR`
    /// stops the simulation so it cannot overwrite the manual status.
    pub async fn update(
        &self,
        id: &InstallationId,
        update: InstallationUpdate,
    ) -> Result<Installation> {
        if update.is_empty() {
            return Err(HangarError::InvalidInput("no updates provided".to_string()));
        }

        let patch = InstallationPatch {
            status: update.status,
            last_ping: (update.status == Some(InstallationStatus::Running)).then(Utc::now),
            config: update.config.map(|config| {
                if config.is_null() {
                    serde_json::Value::Object(serde_json::Map::new())
                } else {
                    config
                }
            }),
        };

        let updated = self.repository.update_installation(id, patch).await?;

        if matches!(
            update.status,
            Some(InstallationStatus::Stopped | InstallationStatus::Error)
        ) {
            self.scheduler.stop(id);
        }

        Ok(updated)
    }

    /// Force a status through one of the `start` / `stop` / `restart`
    /// shorthands. Goes through [`InstallationService::update`], so `stop`
    /// also cancels the simulation timer immediately.
    pub async fn apply_action(&self, id: &InstallationId, action: &str) -> Result<Installation> {
        let action: StatusAction = action
            .parse()
            .map_err(|err: hangar_model::ModelError| HangarError::InvalidInput(err.to_string()))?;
        self.update(id, InstallationUpdate::status(action.target_status()))
            .await
    }

    /// Stop any simulation for `id` and delete the record.
    pub async fn uninstall(&self, id: &InstallationId) -> Result<()> {
        self.scheduler.stop(id);
        self.repository.delete_installation(id).await?;
        tracing::info!(
            target: "installations",
            installation_id = %id,
            "installation removed"
        );
        Ok(())
    }

    /// Simulated health snapshot for `id`.
    pub async fn health(&self, id: &InstallationId) -> Result<HealthMetrics> {
        let installation = self.get(id).await?;
        Ok(health::build_metrics(&installation, Utc::now()))
    }

    /// The `count` most recent simulated log entries for `id`, newest first.
    pub async fn health_logs(&self, id: &InstallationId, count: usize) -> Result<Vec<HealthLog>> {
        let installation = self.get(id).await?;
        Ok(health::build_logs(&installation, count, Utc::now()))
    }

    pub fn active_simulations(&self) -> ActiveSimulations {
        let installations = self.scheduler.list_active();
        ActiveSimulations {
            count: installations.len(),
            installations,
        }
    }
}
