//! Broadcast record store
//!
//! The single shared table of broadcasters. Every read and write goes through
//! one `RwLock`; snapshots are copied out under the read guard and the guard
//! is released before callers serialize them.

use crate::clock::{Clock, SystemClock};
use crate::error::{RegistryError, Result};
use crate::monitor::{LivenessPolicy, StalePolicy, SweepReport};
use crate::record::{BroadcastRecord, BroadcastStatus};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Record as stored after the call
    pub record: BroadcastRecord,

    /// True when the id was absent and a new record was created
    pub created: bool,
}

/// Record counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug)]
struct StoredBroadcast {
    record: BroadcastRecord,
    /// Insertion order, assigned on creation
    seq: u64,
    inactive_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, StoredBroadcast>,
    next_seq: u64,
}

/// In-memory broadcast directory
pub struct BroadcastStore {
    table: RwLock<Table>,
    clock: Arc<dyn Clock>,
}

impl Default for BroadcastStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastStore {
    /// Create a store backed by the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            clock,
        }
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create or refresh a broadcaster.
    ///
    /// A new id gets `created_at = last_seen_at = now`. An existing id keeps
    /// its `created_at` and has its URL replaced, `last_seen_at` refreshed and
    /// status forced back to active.
    pub async fn upsert(&self, broadcaster_id: &str, stream_url: &str) -> UpsertOutcome {
        let mut table = self.table.write().await;
        // Read under the guard so timestamps follow lock order
        let now = self.clock.now();
        let Table { entries, next_seq } = &mut *table;

        match entries.entry(broadcaster_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.record.stream_url = stream_url.to_string();
                entry.record.last_seen_at = now;
                entry.record.status = BroadcastStatus::Active;
                entry.inactive_since = None;

                UpsertOutcome {
                    record: entry.record.clone(),
                    created: false,
                }
            }
            Entry::Vacant(vacant) => {
                let seq = *next_seq;
                *next_seq += 1;

                let record = BroadcastRecord {
                    broadcaster_id: broadcaster_id.to_string(),
                    stream_url: stream_url.to_string(),
                    status: BroadcastStatus::Active,
                    created_at: now,
                    last_seen_at: now,
                };
                vacant.insert(StoredBroadcast {
                    record: record.clone(),
                    seq,
                    inactive_since: None,
                });

                UpsertOutcome {
                    record,
                    created: true,
                }
            }
        }
    }

    /// Delete a broadcaster, returning whether it existed
    pub async fn remove(&self, broadcaster_id: &str) -> bool {
        let mut table = self.table.write().await;
        table.entries.remove(broadcaster_id).is_some()
    }

    /// Copy of a single record
    pub async fn get(&self, broadcaster_id: &str) -> Option<BroadcastRecord> {
        let table = self.table.read().await;
        table.entries.get(broadcaster_id).map(|e| e.record.clone())
    }

    /// Point-in-time copy of every record, in first-registration order
    pub async fn list(&self) -> Vec<BroadcastRecord> {
        let mut snapshot: Vec<(u64, BroadcastRecord)> = {
            let table = self.table.read().await;
            table
                .entries
                .values()
                .map(|e| (e.seq, e.record.clone()))
                .collect()
        };

        snapshot.sort_unstable_by_key(|(seq, _)| *seq);
        snapshot.into_iter().map(|(_, record)| record).collect()
    }

    pub async fn counts(&self) -> StoreCounts {
        let table = self.table.read().await;
        let active = table
            .entries
            .values()
            .filter(|e| e.record.status.is_active())
            .count();

        StoreCounts {
            total: table.entries.len(),
            active,
            inactive: table.entries.len() - active,
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.entries.is_empty()
    }

    /// Demote one broadcaster to inactive.
    ///
    /// Returns false when the id is unknown or already inactive.
    pub async fn mark_inactive(&self, broadcaster_id: &str) -> bool {
        let mut table = self.table.write().await;
        let now = self.clock.now();

        match table.entries.get_mut(broadcaster_id) {
            Some(entry) if entry.record.status.is_active() => {
                entry.record.status = BroadcastStatus::Inactive;
                entry.inactive_since = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Apply the liveness policy to every record as of `now`.
    ///
    /// Active records unseen for longer than the timeout are demoted or
    /// evicted. Inactive records past the retention window are evicted. The
    /// whole scan holds the write guard, so no register can interleave with it.
    pub async fn evict_if_stale(
        &self,
        now: DateTime<Utc>,
        policy: &LivenessPolicy,
    ) -> Result<SweepReport> {
        let timeout = to_chrono(policy.timeout, "liveness timeout")?;
        let retention = policy
            .inactive_retention
            .map(|r| to_chrono(r, "inactive retention"))
            .transpose()?;

        let mut report = SweepReport::default();
        let mut table = self.table.write().await;

        table.entries.retain(|id, entry| match entry.record.status {
            BroadcastStatus::Active => {
                if now - entry.record.last_seen_at <= timeout {
                    return true;
                }
                match policy.stale_policy {
                    StalePolicy::MarkInactive => {
                        entry.record.status = BroadcastStatus::Inactive;
                        entry.inactive_since = Some(now);
                        report.demoted.push(id.clone());
                        true
                    }
                    StalePolicy::Evict => {
                        report.evicted.push(id.clone());
                        false
                    }
                }
            }
            BroadcastStatus::Inactive => {
                let expired = match (retention, entry.inactive_since) {
                    (Some(retention), Some(since)) => now - since > retention,
                    _ => false,
                };
                // Under the evict policy nothing should linger inactive
                if expired || policy.stale_policy == StalePolicy::Evict {
                    report.evicted.push(id.clone());
                    false
                } else {
                    true
                }
            }
        });

        Ok(report)
    }
}

fn to_chrono(duration: std::time::Duration, what: &str) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|e| RegistryError::Internal(format!("{} out of range: {}", what, e)))
}
