//! Liveness monitor
//!
//! Broadcasters refresh their registration by re-registering. The monitor
//! periodically sweeps the store and demotes (or evicts) every broadcaster
//! whose last refresh is older than the liveness timeout.

use crate::error::Result;
use crate::store::BroadcastStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// What happens to an active broadcaster that misses its heartbeat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Keep the record with status `inactive`
    #[default]
    MarkInactive,
    /// Remove the record
    Evict,
}

/// Liveness rules applied by each sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessPolicy {
    /// Maximum time since the last register before a broadcaster is stale
    pub timeout: Duration,

    pub stale_policy: StalePolicy,

    /// How long an inactive record is kept; `None` keeps it until
    /// deregistered or refreshed
    pub inactive_retention: Option<Duration>,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            stale_policy: StalePolicy::MarkInactive,
            inactive_retention: Some(Duration::from_secs(300)),
        }
    }
}

/// Broadcasters touched by one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub demoted: Vec<String>,
    pub evicted: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.demoted.is_empty() && self.evicted.is_empty()
    }
}

/// Periodic stale-broadcaster sweeper
pub struct LivenessMonitor {
    store: Arc<BroadcastStore>,
    policy: LivenessPolicy,
    interval: Duration,
}

impl LivenessMonitor {
    /// Create a monitor. A zero interval is raised to one millisecond.
    pub fn new(store: Arc<BroadcastStore>, policy: LivenessPolicy, interval: Duration) -> Self {
        Self {
            store,
            policy,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn policy(&self) -> &LivenessPolicy {
        &self.policy
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single sweep
    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = self.store.now();
        let report = self.store.evict_if_stale(now, &self.policy).await?;

        for id in &report.demoted {
            tracing::info!(broadcaster_id = %id, "Broadcaster missed heartbeat, marked inactive");
        }
        for id in &report.evicted {
            tracing::info!(broadcaster_id = %id, "Evicted stale broadcaster");
        }
        tracing::debug!(
            demoted = report.demoted.len(),
            evicted = report.evicted.len(),
            "Liveness sweep complete"
        );

        Ok(report)
    }

    /// Sweep on every interval tick until `shutdown` becomes true or its
    /// sender is dropped. A failed sweep is logged and retried next tick.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                interval_ms = self.interval.as_millis() as u64,
                timeout_ms = self.policy.timeout.as_millis() as u64,
                policy = ?self.policy.stale_policy,
                "Liveness monitor started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep().await {
                            tracing::error!(error = %e, "Liveness sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Liveness monitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::record::BroadcastStatus;

    fn monitor_with_clock(
        stale_policy: StalePolicy,
        interval: Duration,
    ) -> (Arc<ManualClock>, Arc<BroadcastStore>, Arc<LivenessMonitor>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(BroadcastStore::with_clock(clock.clone()));
        let policy = LivenessPolicy {
            timeout: Duration::from_secs(15),
            stale_policy,
            inactive_retention: None,
        };
        let monitor = Arc::new(LivenessMonitor::new(store.clone(), policy, interval));
        (clock, store, monitor)
    }

    #[tokio::test]
    async fn test_sweep_marks_stale_inactive() {
        let (clock, store, monitor) =
            monitor_with_clock(StalePolicy::MarkInactive, Duration::from_secs(5));
        store.upsert("user123", "rtsp://127.0.0.1:5051/x").await;

        assert!(monitor.sweep().await.unwrap().is_empty());

        clock.advance(chrono::Duration::seconds(16));
        let report = monitor.sweep().await.unwrap();
        assert_eq!(report.demoted, vec!["user123".to_string()]);
        assert_eq!(
            store.get("user123").await.unwrap().status,
            BroadcastStatus::Inactive
        );
    }

    #[tokio::test]
    async fn test_register_after_sweep_wins() {
        let (clock, store, monitor) =
            monitor_with_clock(StalePolicy::MarkInactive, Duration::from_secs(5));
        store.upsert("user123", "rtsp://a/1").await;
        clock.advance(chrono::Duration::seconds(16));

        monitor.sweep().await.unwrap();
        store.upsert("user123", "rtsp://a/1").await;
        // The refreshed record is not stale for the next sweep
        assert!(monitor.sweep().await.unwrap().is_empty());
        assert_eq!(
            store.get("user123").await.unwrap().status,
            BroadcastStatus::Active
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registers_racing_sweeps_stay_active() {
        let (clock, store, monitor) =
            monitor_with_clock(StalePolicy::MarkInactive, Duration::from_secs(5));
        let ids: Vec<String> = (0..32).map(|i| format!("user{}", i)).collect();
        for id in &ids {
            store.upsert(id, "rtsp://a/old").await;
        }
        // Every existing record is stale from here on
        clock.advance(chrono::Duration::seconds(60));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let monitor = monitor.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    monitor.sweep().await.unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for chunk in ids.chunks(8) {
            let store = store.clone();
            let chunk = chunk.to_vec();
            tasks.push(tokio::spawn(async move {
                for id in chunk {
                    store.upsert(&id, "rtsp://a/new").await;
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // A sweep after the race must not demote fresh heartbeats either
        assert!(monitor.sweep().await.unwrap().is_empty());
        for id in &ids {
            let record = store.get(id).await.unwrap();
            assert_eq!(record.status, BroadcastStatus::Active, "{}", id);
            assert_eq!(record.stream_url, "rtsp://a/new");
            assert_eq!(record.last_seen_at, clock.now());
            assert!(record.last_seen_at >= record.created_at);
        }
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let store = Arc::new(BroadcastStore::new());
        let monitor = LivenessMonitor::new(store, LivenessPolicy::default(), Duration::ZERO);
        assert_eq!(monitor.interval(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_spawned_monitor_sweeps_and_stops() {
        let (clock, store, monitor) =
            monitor_with_clock(StalePolicy::Evict, Duration::from_millis(10));
        store.upsert("user123", "rtsp://a/1").await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = monitor.spawn(shutdown_rx);

        clock.advance(chrono::Duration::seconds(16));

        let evicted = tokio::time::timeout(Duration::from_secs(5), async {
            while !store.is_empty().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(evicted.is_ok(), "monitor never evicted the stale broadcaster");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_monitor_stops_when_sender_dropped() {
        let (_, _, monitor) =
            monitor_with_clock(StalePolicy::MarkInactive, Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = monitor.spawn(shutdown_rx);

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
