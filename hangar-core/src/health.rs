//! Simulated health reporting derived from an installation's status and
//! timestamps.
//!
//! Values are deterministic for a given installation id and wall-clock
//! minute, so repeated polls within a minute agree with each other.

use chrono::{DateTime, Duration, Utc};
use hangar_model::{Installation, InstallationStatus};
use serde::Serialize;

/// Log entries returned when the caller does not ask for a count.
pub const DEFAULT_HEALTH_LOG_COUNT: usize = 160;

/// Spacing between consecutive simulated log entries.
const LOG_SPACING_SECS: i64 = 42;

/// Uptime reported for a running installation younger than this.
const MIN_RUNNING_UPTIME_SECS: u64 = 120;

const ERROR_RATE_MIN: f64 = 0.1;
const ERROR_RATE_MAX: f64 = 12.0;
const DEGRADED_ERROR_RATE: f64 = 4.0;

const LOG_MESSAGES: [&str; 12] = [
    "Metrics flush complete.",
    "Background task finished successfully.",
    "Connection pool healthy.",
    "Heartbeat acknowledged.",
    "Cache warmed for active routes.",
    "Latency spike detected, recovering.",
    "Retrying upstream request.",
    "Slow query detected, optimizing.",
    "Worker restarted after backoff.",
    "Memory usage trending upward.",
    "Rate limit nearing threshold.",
    "Request failed with timeout.",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Offline,
}

impl HealthStatus {
    /// Anything not `RUNNING` is offline; running installations degrade once
    /// the error rate passes 4%.
    pub fn classify(running: bool, error_rate: f64) -> Self {
        if !running {
            HealthStatus::Offline
        } else if error_rate > DEGRADED_ERROR_RATE {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub installation_id: String,
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub avg_response_ms: u64,
    pub requests_per_min: u64,
    /// Percentage, clamped to `0.1..=12`.
    pub error_rate: f64,
    pub last_ping: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
}

/// Health snapshot of `installation` as of `now`.
pub fn build_metrics(installation: &Installation, now: DateTime<Utc>) -> HealthMetrics {
    let seed = seed_for(installation);
    let tick = now.timestamp_millis().div_euclid(60_000);
    let jitter = seeded_random(seed + tick as f64);
    let running = installation.status == InstallationStatus::Running;

    let uptime_seconds = if running {
        let age_ms = (now - installation.created_at).num_milliseconds().max(0);
        ((age_ms as f64 / 1000.0).round() as u64).max(MIN_RUNNING_UPTIME_SECS)
    } else {
        0
    };

    let avg_response_ms = (80.0 + jitter * 140.0 + if running { 0.0 } else { 40.0 }).round();
    let requests_per_min = (if running { 180.0 } else { 40.0 } + jitter * 120.0).round();
    let base_error_rate = match installation.status {
        InstallationStatus::Error => 6.0,
        InstallationStatus::Running => 0.6,
        _ => 2.2,
    };
    let error_rate = (base_error_rate + jitter * 1.6).clamp(ERROR_RATE_MIN, ERROR_RATE_MAX);

    HealthMetrics {
        installation_id: installation.id.to_string(),
        status: HealthStatus::classify(running, error_rate),
        uptime_seconds,
        avg_response_ms: avg_response_ms as u64,
        requests_per_min: requests_per_min as u64,
        error_rate,
        last_ping: installation.last_ping,
        updated_at: now,
    }
}

/// `count` simulated log entries, newest first, spaced 42 seconds apart
/// ending at `now`.
pub fn build_logs(
    installation: &Installation,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<HealthLog> {
    let seed = seed_for(installation);
    let source = match installation.status {
        InstallationStatus::Running => "runtime",
        _ => "scheduler",
    };
    let error_bias = match installation.status {
        InstallationStatus::Error => 0.35,
        _ => 0.1,
    };

    (0..count)
        .map(|index| {
            let roll = seeded_random(seed + index as f64);
            let level = if roll > 1.0 - error_bias {
                LogLevel::Error
            } else if roll > 0.7 {
                LogLevel::Warn
            } else {
                LogLevel::Info
            };

            let pick = seeded_random(seed + (index * 3) as f64) * LOG_MESSAGES.len() as f64;
            let message = LOG_MESSAGES[(pick as usize).min(LOG_MESSAGES.len() - 1)];

            HealthLog {
                id: format!("{}-{index}", installation.id),
                timestamp: now - Duration::seconds(index as i64 * LOG_SPACING_SECS),
                level,
                message: message.to_string(),
                source: source.to_string(),
            }
        })
        .collect()
}

fn seed_for(installation: &Installation) -> f64 {
    f64::from(hash_id(installation.id.as_str()))
}

/// Rolling base-31 hash over UTF-16 code units, kept below 100 000.
fn hash_id(value: &str) -> u32 {
    value
        .encode_utf16()
        .fold(0u32, |hash, unit| (hash * 31 + u32::from(unit)) % 100_000)
}

/// Fractional part of `sin(seed) * 10000`, in `[0, 1)`.
fn seeded_random(seed: f64) -> f64 {
    let x = seed.sin() * 10_000.0;
    x - x.floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hangar_model::{InstallationId, ServerId};

    fn installation(status: InstallationStatus) -> Installation {
        let mut installation = Installation::pending(ServerId::from("filesystem"))
            .with_id(InstallationId::from("inst-1"));
        installation.status = status;
        installation.created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        installation
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap()
    }

    #[test]
    fn running_installation_reports_uptime_and_health() {
        let metrics = build_metrics(&installation(InstallationStatus::Running), now());

        assert_eq!(metrics.uptime_seconds, 3_600);
        assert_eq!(metrics.status, HealthStatus::Healthy);
        assert!((180..=300).contains(&metrics.requests_per_min));
        assert!((80..=220).contains(&metrics.avg_response_ms));
        assert!(metrics.error_rate >= 0.6 && metrics.error_rate <= 2.2);
    }

    #[test]
    fn young_running_installation_reports_minimum_uptime() {
        let mut running = installation(InstallationStatus::Running);
        running.created_at = now() - Duration::seconds(5);

        assert_eq!(build_metrics(&running, now()).uptime_seconds, 120);
    }

    #[test]
    fn non_running_installations_are_offline() {
        for status in [
            InstallationStatus::Pending,
            InstallationStatus::Installing,
            InstallationStatus::Stopped,
            InstallationStatus::Error,
        ] {
            let metrics = build_metrics(&installation(status), now());
            assert_eq!(metrics.status, HealthStatus::Offline, "{status}");
            assert_eq!(metrics.uptime_seconds, 0);
            assert!(metrics.avg_response_ms >= 120);
        }

        let errored = build_metrics(&installation(InstallationStatus::Error), now());
        assert!(errored.error_rate >= 6.0 && errored.error_rate <= 7.6);
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(HealthStatus::classify(true, 4.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify(true, 4.01), HealthStatus::Degraded);
        assert_eq!(HealthStatus::classify(false, 0.1), HealthStatus::Offline);
    }

    #[test]
    fn metrics_are_stable_within_a_minute() {
        let running = installation(InstallationStatus::Running);
        let first = build_metrics(&running, now());
        let later = build_metrics(&running, now() + Duration::seconds(30));

        assert_eq!(first.avg_response_ms, later.avg_response_ms);
        assert_eq!(first.requests_per_min, later.requests_per_min);
        assert_eq!(first.error_rate, later.error_rate);
    }

    #[test]
    fn metrics_carry_last_ping() {
        let mut running = installation(InstallationStatus::Running);
        running.last_ping = Some(now());

        let json = serde_json::to_value(build_metrics(&running, now())).expect("serialize");

        assert_eq!(json["installationId"], "inst-1");
        assert_eq!(json["status"], "HEALTHY");
        assert!(json["lastPing"].is_string());
    }

    #[test]
    fn logs_are_spaced_and_deterministic() {
        let running = installation(InstallationStatus::Running);
        let logs = build_logs(&running, 5, now());

        assert_eq!(logs.len(), 5);
        assert_eq!(logs[0].id, "inst-1-0");
        assert_eq!(logs[4].id, "inst-1-4");
        assert_eq!(logs[0].timestamp, now());
        assert_eq!(logs[1].timestamp, now() - Duration::seconds(42));
        assert!(logs.iter().all(|log| log.source == "runtime"));
        assert!(logs.iter().all(|log| LOG_MESSAGES.contains(&log.message.as_str())));
        assert_eq!(logs, build_logs(&running, 5, now()));

        let pending = build_logs(&installation(InstallationStatus::Pending), 3, now());
        assert!(pending.iter().all(|log| log.source == "scheduler"));
    }

    #[test]
    fn hash_matches_rolling_definition() {
        assert_eq!(hash_id(""), 0);
        assert_eq!(hash_id("a"), 97);
        assert_eq!(hash_id("ab"), 97 * 31 + 98);
    }
}
