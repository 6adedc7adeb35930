use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Operational status of an installation.
///
/// Serialized in upper snake case (`PENDING`, `INSTALLING`, ...) to match the
/// persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum InstallationStatus {
    Pending,
    Installing,
    Running,
    Stopped,
    Error,
}

impl InstallationStatus {
    pub const ALL: [InstallationStatus; 5] = [
        InstallationStatus::Pending,
        InstallationStatus::Installing,
        InstallationStatus::Running,
        InstallationStatus::Stopped,
        InstallationStatus::Error,
    ];

    /// Terminal statuses are never advanced by the lifecycle simulator.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InstallationStatus::Running
                | InstallationStatus::Stopped
                | InstallationStatus::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstallationStatus::Pending => "PENDING",
            InstallationStatus::Installing => "INSTALLING",
            InstallationStatus::Running => "RUNNING",
            InstallationStatus::Stopped => "STOPPED",
            InstallationStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for InstallationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstallationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModelError::InvalidStatus(s.to_string()))
    }
}

/// User-facing shorthand for forcing an installation's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatusAction {
    Start,
    Stop,
    Restart,
}

impl StatusAction {
    /// Status written when the action is applied.
    pub fn target_status(self) -> InstallationStatus {
        match self {
            StatusAction::Start | StatusAction::Restart => {
                InstallationStatus::Running
            }
            StatusAction::Stop => InstallationStatus::Stopped,
        }
    }
}

impl FromStr for StatusAction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(StatusAction::Start),
            "stop" => Ok(StatusAction::Stop),
            "restart" => Ok(StatusAction::Restart),
            other => Err(ModelError::InvalidAction(other.to_string())),
        }
    }
}
