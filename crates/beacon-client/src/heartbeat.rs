//! Broadcaster heartbeat
//!
//! A broadcaster stays `active` in the directory only while it keeps
//! re-registering. The heartbeat task does that on a fixed interval and
//! deregisters when stopped.

use crate::client::DiscoveryClient;
use crate::error::Result;
use beacon_registry::BroadcastInfo;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Periodic re-registration of one broadcaster
pub struct Heartbeat;

impl Heartbeat {
    /// Register now, then again every `period`, until the handle is stopped.
    ///
    /// Failed registrations are logged and retried on the next tick.
    pub fn spawn(
        client: DiscoveryClient,
        broadcaster_id: impl Into<String>,
        stream_url: impl Into<String>,
        period: Duration,
    ) -> HeartbeatHandle {
        let broadcaster_id = broadcaster_id.into();
        let stream_url = stream_url.into();
        let period = period.max(Duration::from_millis(1));

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (registered_tx, registered_rx) = watch::channel(None);

        let task = {
            let client = client.clone();
            let broadcaster_id = broadcaster_id.clone();
            tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match client.register(&broadcaster_id, &stream_url).await {
                                Ok(info) => {
                                    tracing::debug!(broadcaster_id = %broadcaster_id, "Heartbeat sent");
                                    let _ = registered_tx.send(Some(info));
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        broadcaster_id = %broadcaster_id,
                                        error = %e,
                                        "Heartbeat failed, retrying next interval"
                                    );
                                }
                            }
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            })
        };

        HeartbeatHandle {
            client,
            broadcaster_id,
            shutdown_tx,
            registered_rx,
            task,
        }
    }
}

/// Handle to a running heartbeat
pub struct HeartbeatHandle {
    client: DiscoveryClient,
    broadcaster_id: String,
    shutdown_tx: watch::Sender<bool>,
    registered_rx: watch::Receiver<Option<BroadcastInfo>>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub fn broadcaster_id(&self) -> &str {
        &self.broadcaster_id
    }

    /// Response to the most recent successful registration
    pub fn last_registration(&self) -> Option<BroadcastInfo> {
        self.registered_rx.borrow().clone()
    }

    /// Wait for the first successful registration
    pub async fn registered(&mut self) -> Option<BroadcastInfo> {
        loop {
            if let Some(info) = self.registered_rx.borrow_and_update().clone() {
                return Some(info);
            }
            if self.registered_rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Stop heartbeating and deregister.
    ///
    /// A broadcaster the daemon already dropped counts as deregistered.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Heartbeat task failed");
        }

        match self.client.deregister(&self.broadcaster_id).await {
            Ok(()) => {
                tracing::info!(broadcaster_id = %self.broadcaster_id, "Deregistered");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(broadcaster_id = %self.broadcaster_id, "Already deregistered");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
