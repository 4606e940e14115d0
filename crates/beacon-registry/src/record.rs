//! Broadcast record types
//!
//! A BroadcastRecord is the store's view of one broadcaster. BroadcastInfo is
//! the subset exchanged with callers; it never carries `last_seen_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Liveness status of a broadcaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    /// Registered and recently refreshed
    Active,
    /// Known but presumed stopped
    Inactive,
}

impl BroadcastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastStatus::Active => "active",
            BroadcastStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BroadcastStatus::Active)
    }
}

impl std::fmt::Display for BroadcastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BroadcastStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(BroadcastStatus::Active),
            "inactive" => Ok(BroadcastStatus::Inactive),
            other => Err(format!("Unknown broadcast status: {}", other)),
        }
    }
}

/// One broadcaster as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    /// Caller-supplied primary key
    pub broadcaster_id: String,

    /// Advertised stream endpoint, stored verbatim
    pub stream_url: String,

    /// Current liveness status
    pub status: BroadcastStatus,

    /// First registration time; survives heartbeats
    pub created_at: DateTime<Utc>,

    /// Last register call for this id
    pub last_seen_at: DateTime<Utc>,
}

impl BroadcastRecord {
    pub fn info(&self) -> BroadcastInfo {
        BroadcastInfo::from(self)
    }
}

/// Externally visible shape of a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastInfo {
    pub broadcaster_id: String,
    pub stream_url: String,
    pub status: BroadcastStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&BroadcastRecord> for BroadcastInfo {
    fn from(record: &BroadcastRecord) -> Self {
        Self {
            broadcaster_id: record.broadcaster_id.clone(),
            stream_url: record.stream_url.clone(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

impl From<BroadcastRecord> for BroadcastInfo {
    fn from(record: BroadcastRecord) -> Self {
        Self {
            broadcaster_id: record.broadcaster_id,
            stream_url: record.stream_url,
            status: record.status,
            created_at: record.created_at,
        }
    }
}
