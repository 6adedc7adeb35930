#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hangar_core::{
    FixedJitter, HangarError, InMemoryInstallationStore, LifecycleConfig,
    LifecycleScheduler, Result, StatusStore,
};
use hangar_model::{Installation, InstallationId, InstallationStatus, ServerId};

/// Status store that counts writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryInstallationStore,
    writes: AtomicUsize,
    written: Mutex<Vec<InstallationStatus>>,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, id: &str, status: InstallationStatus) {
        let mut installation = Installation::pending(ServerId::from("test-server"))
            .with_id(InstallationId::from(id));
        installation.status = status;
        self.inner.seed(installation).await;
    }

    pub async fn status(&self, id: &str) -> Option<InstallationStatus> {
        self.inner
            .read_status(&InstallationId::from(id))
            .await
            .expect("in-memory read never fails")
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful writes of `status`.
    pub fn writes_of(&self, status: InstallationStatus) -> usize {
        self.written
            .lock()
            .expect("write log poisoned")
            .iter()
            .filter(|written| **written == status)
            .count()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusStore for RecordingStore {
    async fn read_status(
        &self,
        id: &InstallationId,
    ) -> Result<Option<InstallationStatus>> {
        self.inner.read_status(id).await
    }

    async fn write_status(
        &self,
        id: &InstallationId,
        status: InstallationStatus,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HangarError::Store("DB error".to_string()));
        }
        self.inner.write_status(id, status).await?;
        self.written.lock().expect("write log poisoned").push(status);
        Ok(())
    }
}

pub fn scheduler(store: &Arc<RecordingStore>) -> LifecycleScheduler {
    LifecycleScheduler::with_jitter(
        store.clone(),
        LifecycleConfig::default(),
        Arc::new(FixedJitter::ZERO),
    )
}

pub fn id(raw: &str) -> InstallationId {
    InstallationId::from(raw)
}

/// Let spawned simulation tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock and let woken tasks finish.
pub async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}
