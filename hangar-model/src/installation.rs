use chrono::{DateTime, Utc};

use crate::ids::{InstallationId, ServerId};
use crate::status::InstallationStatus;

/// Persisted record of one MCP server installation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Installation {
    pub id: InstallationId,
    pub server_id: ServerId,
    pub status: InstallationStatus,
    /// Last time the installation was reported `RUNNING` by a caller.
    pub last_ping: Option<DateTime<Utc>>,
    pub error_log: Option<String>,
    /// Free-form per-installation settings, always a JSON object.
    #[cfg_attr(feature = "serde", serde(default = "empty_config"))]
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(feature = "serde")]
fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Installation {
    /// New record in `PENDING`, ready to hand to the lifecycle simulator.
    pub fn pending(server_id: ServerId) -> Self {
        Self {
            id: InstallationId::new(),
            server_id,
            status: InstallationStatus::Pending,
            last_ping: None,
            error_log: None,
            config: serde_json::Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: InstallationId) -> Self {
        self.id = id;
        self
    }
}

/// Partial update applied by callers outside the simulator.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstallationUpdate {
    pub status: Option<InstallationStatus>,
    pub config: Option<serde_json::Value>,
}

impl InstallationUpdate {
    pub fn status(status: InstallationStatus) -> Self {
        Self {
            status: Some(status),
            config: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.config.is_none()
    }
}
