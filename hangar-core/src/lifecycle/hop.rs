//! The fixed two-hop install pipeline and the guarded transition that runs
//! when a hop's timer fires.

use std::fmt;
use std::time::Duration;

use hangar_model::{InstallationId, InstallationStatus};

use super::config::LifecycleConfig;
use crate::store::StatusStore;

/// One delayed transition of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hop {
    /// Status the record must still hold when the hop fires.
    pub expected: InstallationStatus,
    /// Status written when the guard passes.
    pub next: InstallationStatus,
}

impl Hop {
    pub const PENDING_TO_INSTALLING: Hop = Hop {
        expected: InstallationStatus::Pending,
        next: InstallationStatus::Installing,
    };

    pub const INSTALLING_TO_RUNNING: Hop = Hop {
        expected: InstallationStatus::Installing,
        next: InstallationStatus::Running,
    };

    /// First hop of every simulation.
    pub const FIRST: Hop = Hop::PENDING_TO_INSTALLING;

    /// Hop table keyed by the expected pre-transition status.
    pub fn from_expected(status: InstallationStatus) -> Option<Hop> {
        match status {
            InstallationStatus::Pending => Some(Hop::PENDING_TO_INSTALLING),
            InstallationStatus::Installing => Some(Hop::INSTALLING_TO_RUNNING),
            InstallationStatus::Running
            | InstallationStatus::Stopped
            | InstallationStatus::Error => None,
        }
    }

    pub fn base_delay(&self, config: &LifecycleConfig) -> Duration {
        match self.expected {
            InstallationStatus::Installing => config.installing_delay(),
            _ => config.pending_delay(),
        }
    }
}

/// Why a simulation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The record disappeared, e.g. the installation was deleted.
    Missing,
    /// Another actor already finalized the record.
    AlreadyTerminal(InstallationStatus),
    /// The record moved away from the status the hop expected.
    Superseded {
        expected: InstallationStatus,
        observed: InstallationStatus,
    },
    ReadFailed(String),
    WriteFailed(String),
    /// The pipeline wrote its terminal status.
    Completed(InstallationStatus),
}

impl StopReason {
    /// Store faults, as opposed to expected terminations.
    pub fn is_fault(&self) -> bool {
        matches!(self, StopReason::ReadFailed(_) | StopReason::WriteFailed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Missing => write!(f, "installation no longer exists"),
            StopReason::AlreadyTerminal(status) => write!(f, "installation already {status}"),
            StopReason::Superseded { expected, observed } => {
                write!(f, "expected {expected}, found {observed}")
            }
            StopReason::ReadFailed(err) => write!(f, "status read failed: {err}"),
            StopReason::WriteFailed(err) => write!(f, "status write failed: {err}"),
            StopReason::Completed(status) => write!(f, "completed as {status}"),
        }
    }
}

/// Result of a fired hop: schedule the next one, or tear the entry down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HopOutcome {
    Continue(Hop),
    Stop(StopReason),
}

/// Re-read the authoritative status and write `hop.next` only if the record
/// still holds `hop.expected`. Never retries.
pub async fn run_hop<S>(store: &S, id: &InstallationId, hop: Hop) -> HopOutcome
where
    S: StatusStore + ?Sized,
{
    let current = match store.read_status(id).await {
        Ok(Some(status)) => status,
        Ok(None) => return HopOutcome::Stop(StopReason::Missing),
        Err(err) => return HopOutcome::Stop(StopReason::ReadFailed(err.to_string())),
    };

    if current.is_terminal() {
        return HopOutcome::Stop(StopReason::AlreadyTerminal(current));
    }

    if current != hop.expected {
        return HopOutcome::Stop(StopReason::Superseded {
            expected: hop.expected,
            observed: current,
        });
    }

    if let Err(err) = store.write_status(id, hop.next).await {
        return HopOutcome::Stop(StopReason::WriteFailed(err.to_string()));
    }

    if hop.next.is_terminal() {
        return HopOutcome::Stop(StopReason::Completed(hop.next));
    }

    match Hop::from_expected(hop.next) {
        Some(next_hop) => HopOutcome::Continue(next_hop),
        None => HopOutcome::Stop(StopReason::Completed(hop.next)),
    }
}
