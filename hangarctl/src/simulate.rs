use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hangar_config::HangarConfig;
use hangar_core::{
    FixedJitter, InMemoryInstallationStore, InstallationService, JitterSource,
    LifecycleConfig, LifecycleScheduler, UniformJitter,
};
use hangar_model::{InstallationId, InstallationStatus, ServerId};

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub servers: Vec<String>,
    pub count: usize,
    pub speed: u64,
    pub no_jitter: bool,
    pub stop_at_installing: Option<String>,
    pub poll_ms: u64,
    pub health: bool,
}

impl SimulateOptions {
    fn server_ids(&self) -> Vec<ServerId> {
        if self.servers.is_empty() {
            (1..=self.count)
                .map(|n| ServerId(format!("server-{n}")))
                .collect()
        } else {
            self.servers
                .iter()
                .map(|server| ServerId::from(server.as_str()))
                .collect()
        }
    }

    fn lifecycle(&self, base: LifecycleConfig) -> LifecycleConfig {
        let speed = self.speed.max(1);
        let scaled = LifecycleConfig {
            pending_delay_ms: (base.pending_delay_ms / speed).max(1),
            installing_delay_ms: (base.installing_delay_ms / speed).max(1),
            jitter_max_ms: base.jitter_max_ms / speed,
        };
        if self.no_jitter {
            scaled.without_jitter()
        } else {
            scaled
        }
    }
}

pub async fn run(config: &HangarConfig, options: SimulateOptions) -> Result<()> {
    let lifecycle = options.lifecycle(config.lifecycle);
    let jitter: Arc<dyn JitterSource> = if options.no_jitter {
        Arc::new(FixedJitter::ZERO)
    } else {
        Arc::new(UniformJitter)
    };

    let store = Arc::new(InMemoryInstallationStore::new());
    let scheduler = LifecycleScheduler::with_jitter(store.clone(), lifecycle, jitter);
    let service = InstallationService::with_scheduler(store, scheduler);

    let effective = service.scheduler().config();
    tracing::info!(
        pending_delay_ms = effective.pending_delay_ms,
        installing_delay_ms = effective.installing_delay_ms,
        jitter_max_ms = effective.jitter_max_ms,
        "starting simulation"
    );

    for server_id in options.server_ids() {
        let outcome = service
            .install(server_id.clone())
            .await
            .with_context(|| format!("failed to install {server_id}"))?;
        if outcome.already_installed {
            println!("{:<16} already installed", server_id.as_str());
        }
    }

    let mut seen: HashMap<InstallationId, InstallationStatus> = HashMap::new();
    let mut stopped: HashSet<InstallationId> = HashSet::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(options.poll_ms.max(1)));

    loop {
        ticker.tick().await;

        for installation in service.list(None).await? {
            if seen.get(&installation.id) != Some(&installation.status) {
                println!(
                    "{:<16} {:<38} {}",
                    installation.server_id.as_str(),
                    installation.id.as_str(),
                    installation.status
                );
                seen.insert(installation.id.clone(), installation.status);
            }

            let should_stop = installation.status == InstallationStatus::Installing
                && options.stop_at_installing.as_deref() == Some(installation.server_id.as_str())
                && !stopped.contains(&installation.id);
            if should_stop {
                service
                    .apply_action(&installation.id, "stop")
                    .await
                    .with_context(|| format!("failed to stop {}", installation.id))?;
                stopped.insert(installation.id.clone());
            }
        }

        if service.active_simulations().count == 0 {
            break;
        }
    }

    // Pick up statuses written between the last poll and the final hop.
    for installation in service.list(None).await? {
        if seen.get(&installation.id) != Some(&installation.status) {
            println!(
                "{:<16} {:<38} {}",
                installation.server_id.as_str(),
                installation.id.as_str(),
                installation.status
            );
        }
    }

    let installations = service.list(None).await?;
    let summary = serde_json::to_string_pretty(&installations)
        .context("failed to render installation summary")?;
    println!("{summary}");

    if options.health {
        let mut metrics = Vec::with_capacity(installations.len());
        for installation in &installations {
            metrics.push(service.health(&installation.id).await?);
        }
        let rendered = serde_json::to_string_pretty(&metrics)
            .context("failed to render health metrics")?;
        println!("{rendered}");
    }
    Ok(())
}
