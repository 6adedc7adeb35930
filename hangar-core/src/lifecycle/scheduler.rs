use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use hangar_model::InstallationId;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::config::LifecycleConfig;
use super::hop::{Hop, HopOutcome, StopReason, run_hop};
use super::jitter::{JitterSource, UniformJitter};
use crate::store::StatusStore;

/// Registry entry for an installation with a live timer.
#[derive(Debug)]
struct SimulationHandle {
    /// Distinguishes a restarted simulation from the one it replaced so a
    /// finishing task never evicts its successor.
    generation: u64,
    token: CancellationToken,
}

struct SchedulerInner {
    store: Arc<dyn StatusStore>,
    config: LifecycleConfig,
    jitter: Arc<dyn JitterSource>,
    active: DashMap<InstallationId, SimulationHandle>,
    next_generation: AtomicU64,
    shutdown_token: CancellationToken,
    runtime: Handle,
}

impl SchedulerInner {
    fn hop_delay(&self, hop: Hop) -> Duration {
        hop.base_delay(&self.config) + self.jitter.sample(self.config.jitter_max_ms)
    }

    fn release(&self, id: &InstallationId, generation: u64) {
        self.active
            .remove_if(id, |_, handle| handle.generation == generation);
    }
}

/// Drives installations through `PENDING -> INSTALLING -> RUNNING` on timers.
///
/// Each started installation owns one spawned task that sleeps through a hop
/// delay, re-validates the persisted status, writes the next status and
/// either schedules the following hop or removes itself from the registry.
/// The public operations never fail; store faults are logged and end the
/// simulation for that id.
///
/// Cloning is cheap and every clone shares the same registry. Timers run on
/// the tokio runtime captured at construction, so [`LifecycleScheduler::start`]
/// and [`LifecycleScheduler::stop`] may be called from any thread.
#[derive(Clone)]
pub struct LifecycleScheduler {
    inner: Arc<SchedulerInner>,
}

impl fmt::Debug for LifecycleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleScheduler")
            .field("config", &self.inner.config)
            .field("jitter", &self.inner.jitter)
            .field("active_count", &self.inner.active.len())
            .field("shutdown_cancelled", &self.inner.shutdown_token.is_cancelled())
            .finish()
    }
}

impl LifecycleScheduler {
    /// Scheduler with uniform hop jitter, running timers on the current
    /// tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`LifecycleScheduler::with_runtime`] to pass a handle explicitly.
    pub fn new(store: Arc<dyn StatusStore>, config: LifecycleConfig) -> Self {
        Self::with_jitter(store, config, Arc::new(UniformJitter))
    }

    /// Like [`LifecycleScheduler::new`] with a caller-supplied jitter source.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn with_jitter(
        store: Arc<dyn StatusStore>,
        config: LifecycleConfig,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        Self::with_runtime(store, config, jitter, Handle::current())
    }

    pub fn with_runtime(
        store: Arc<dyn StatusStore>,
        config: LifecycleConfig,
        jitter: Arc<dyn JitterSource>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                config,
                jitter,
                active: DashMap::new(),
                next_generation: AtomicU64::new(0),
                shutdown_token: CancellationToken::new(),
                runtime,
            }),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.inner.config
    }

    /// Begin (or restart) the simulated install for `id`.
    ///
    /// Any timer already registered for `id` is cancelled and replaced. The
    /// record is not inspected here; unknown ids end quietly when the first
    /// hop fires.
    pub fn start(&self, id: InstallationId) {
        if self.inner.shutdown_token.is_cancelled() {
            tracing::debug!(
                target: "lifecycle::scheduler",
                installation_id = %id,
                "scheduler shut down; ignoring start"
            );
            return;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = self.inner.shutdown_token.child_token();
        let handle = SimulationHandle {
            generation,
            token: token.clone(),
        };

        if let Some(previous) = self.inner.active.insert(id.clone(), handle) {
            previous.token.cancel();
            tracing::debug!(
                target: "lifecycle::scheduler",
                installation_id = %id,
                "restarting simulation"
            );
        }

        self.inner.runtime.spawn(drive_simulation(
            Arc::clone(&self.inner),
            id,
            generation,
            token,
        ));
    }

    /// Cancel the pending timer for `id`, if any. Returns whether a timer was
    /// cancelled. The persisted status is left untouched.
    pub fn stop(&self, id: &InstallationId) -> bool {
        match self.inner.active.remove(id) {
            Some((_, handle)) => {
                handle.token.cancel();
                tracing::debug!(
                    target: "lifecycle::scheduler",
                    installation_id = %id,
                    "simulation stopped"
                );
                true
            }
            None => false,
        }
    }

    /// Ids with a live timer at call time, in no particular order.
    pub fn list_active(&self) -> Vec<InstallationId> {
        self.inner
            .active
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn is_active(&self, id: &InstallationId) -> bool {
        self.inner.active.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.len()
    }

    /// Cancel every pending timer and refuse further starts.
    pub fn shutdown(&self) {
        self.inner.shutdown_token.cancel();
        self.inner.active.clear();
        tracing::info!(target: "lifecycle::scheduler", "lifecycle scheduler shut down");
    }
}

async fn drive_simulation(
    inner: Arc<SchedulerInner>,
    id: InstallationId,
    generation: u64,
    token: CancellationToken,
) {
    let mut hop = Hop::FIRST;

    loop {
        let delay = inner.hop_delay(hop);
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            outcome = run_hop(inner.store.as_ref(), &id, hop) => outcome,
        };

        match outcome {
            HopOutcome::Continue(next) => {
                tracing::debug!(
                    target: "lifecycle::hop",
                    installation_id = %id,
                    status = %hop.next,
                    "hop applied"
                );
                hop = next;
            }
            HopOutcome::Stop(reason) => {
                inner.release(&id, generation);
                log_stop(&id, &reason);
                return;
            }
        }
    }
}

fn log_stop(id: &InstallationId, reason: &StopReason) {
    match reason {
        StopReason::Completed(status) => tracing::info!(
            target: "lifecycle::scheduler",
            installation_id = %id,
            status = %status,
            "simulation complete"
        ),
        reason if reason.is_fault() => tracing::warn!(
            target: "lifecycle::scheduler",
            installation_id = %id,
            reason = %reason,
            "store failure; simulation abandoned"
        ),
        reason => tracing::debug!(
            target: "lifecycle::scheduler",
            installation_id = %id,
            reason = %reason,
            "simulation ended"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::jitter::FixedJitter;
    use crate::store::InMemoryInstallationStore;
    use hangar_model::{Installation, InstallationStatus, ServerId};

    async fn settle() {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    async fn seeded(ids: &[&str]) -> (Arc<InMemoryInstallationStore>, LifecycleScheduler) {
        let store = Arc::new(InMemoryInstallationStore::new());
        for id in ids {
            store
                .seed(
                    Installation::pending(ServerId::from("filesystem"))
                        .with_id(InstallationId::from(*id)),
                )
                .await;
        }
        let scheduler = LifecycleScheduler::with_jitter(
            store.clone(),
            LifecycleConfig::default(),
            Arc::new(FixedJitter::ZERO),
        );
        (store, scheduler)
    }

    async fn status_of(store: &InMemoryInstallationStore, id: &str) -> Option<InstallationStatus> {
        store
            .read_status(&InstallationId::from(id))
            .await
            .expect("read status")
    }

    #[tokio::test(start_paused = true)]
    async fn start_registers_installation() {
        let (_store, scheduler) = seeded(&["install-1"]).await;

        scheduler.start(InstallationId::from("install-1"));

        assert!(scheduler.is_active(&InstallationId::from("install-1")));
        assert_eq!(scheduler.list_active(), vec![InstallationId::from("install-1")]);
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_reaches_running_and_deregisters() {
        let (store, scheduler) = seeded(&["x"]).await;

        scheduler.start(InstallationId::from("x"));
        settle().await;

        advance_ms(4_999).await;
        assert_eq!(status_of(&store, "x").await, Some(InstallationStatus::Pending));

        advance_ms(1).await;
        assert_eq!(status_of(&store, "x").await, Some(InstallationStatus::Installing));
        assert!(scheduler.is_active(&InstallationId::from("x")));

        advance_ms(10_000).await;
        assert_eq!(status_of(&store, "x").await, Some(InstallationStatus::Running));
        assert!(scheduler.list_active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_hop_prevents_writes() {
        let (store, scheduler) = seeded(&["install-4"]).await;
        let id = InstallationId::from("install-4");

        scheduler.start(id.clone());
        assert!(scheduler.stop(&id));
        assert!(!scheduler.is_active(&id));

        advance_ms(20_000).await;
        assert_eq!(status_of(&store, "install-4").await, Some(InstallationStatus::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (_store, scheduler) = seeded(&[]).await;
        let id = InstallationId::from("never-started");

        assert!(!scheduler.stop(&id));
        assert!(!scheduler.stop(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timer() {
        let (store, scheduler) = seeded(&["install-r"]).await;
        let id = InstallationId::from("install-r");

        scheduler.start(id.clone());
        settle().await;
        advance_ms(3_000).await;
        scheduler.start(id.clone());
        settle().await;

        // The first timer would have fired at 5s; the restart pushes it to 8s.
        advance_ms(2_000).await;
        assert_eq!(status_of(&store, "install-r").await, Some(InstallationStatus::Pending));
        assert_eq!(scheduler.active_count(), 1);

        advance_ms(3_000).await;
        assert_eq!(status_of(&store, "install-r").await, Some(InstallationStatus::Installing));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_installation_ends_quietly() {
        let (_store, scheduler) = seeded(&[]).await;
        let id = InstallationId::from("ghost");

        scheduler.start(id.clone());
        settle().await;
        advance_ms(5_000).await;

        assert!(!scheduler.is_active(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything() {
        let (store, scheduler) = seeded(&["a", "b"]).await;

        scheduler.start(InstallationId::from("a"));
        scheduler.start(InstallationId::from("b"));
        scheduler.shutdown();
        scheduler.start(InstallationId::from("a"));

        advance_ms(20_000).await;
        assert!(scheduler.list_active().is_empty());
        assert_eq!(status_of(&store, "a").await, Some(InstallationStatus::Pending));
        assert_eq!(status_of(&store, "b").await, Some(InstallationStatus::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_from_plain_thread_replaces_timer() {
        let (store, scheduler) = seeded(&["x"]).await;
        let id = InstallationId::from("x");

        scheduler.start(id.clone());
        settle().await;
        advance_ms(3_000).await;

        let remote = scheduler.clone();
        let remote_id = id.clone();
        std::thread::spawn(move || remote.start(remote_id))
            .join()
            .expect("restart thread");
        settle().await;

        advance_ms(2_000).await;
        assert_eq!(status_of(&store, "x").await, Some(InstallationStatus::Pending));
        assert_eq!(scheduler.list_active(), vec![id.clone()]);

        advance_ms(3_000).await;
        assert_eq!(status_of(&store, "x").await, Some(InstallationStatus::Installing));
    }

    #[test]
    fn scheduler_built_with_handle_accepts_starts_from_any_thread() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let store = Arc::new(InMemoryInstallationStore::new());
        let scheduler = LifecycleScheduler::with_runtime(
            store,
            LifecycleConfig::default(),
            Arc::new(FixedJitter::ZERO),
            runtime.handle().clone(),
        );

        scheduler.start(InstallationId::from("x"));

        assert_eq!(scheduler.list_active(), vec![InstallationId::from("x")]);
        assert_eq!(scheduler.config(), &LifecycleConfig::default());
    }
}
