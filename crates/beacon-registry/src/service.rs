//! Registry service
//!
//! Request-level operations over the store: input validation, the list
//! visibility policy and the not-found mapping. Transport layers call this and
//! translate [`RegistryError`] into their own responses.

use crate::error::{RegistryError, Result};
use crate::record::{BroadcastRecord, BroadcastStatus};
use crate::store::{BroadcastStore, StoreCounts, UpsertOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Register request as received from a broadcaster.
///
/// Fields are optional so that absence is reported as a validation error
/// rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterBroadcast {
    #[serde(default)]
    pub broadcaster_id: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
}

impl RegisterBroadcast {
    pub fn new(broadcaster_id: impl Into<String>, stream_url: impl Into<String>) -> Self {
        Self {
            broadcaster_id: Some(broadcaster_id.into()),
            stream_url: Some(stream_url.into()),
        }
    }
}

/// Which records list and lookup expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPolicy {
    /// Show inactive broadcasters (with status `inactive`) instead of hiding them
    pub include_inactive: bool,
}

impl Default for ListPolicy {
    fn default() -> Self {
        Self {
            include_inactive: true,
        }
    }
}

impl ListPolicy {
    fn admits(&self, record: &BroadcastRecord) -> bool {
        self.include_inactive || record.status.is_active()
    }
}

/// Register / deregister / list over a shared store
pub struct RegistryService {
    store: Arc<BroadcastStore>,
    list_policy: ListPolicy,
}

impl RegistryService {
    pub fn new(store: Arc<BroadcastStore>, list_policy: ListPolicy) -> Self {
        Self { store, list_policy }
    }

    pub fn store(&self) -> &Arc<BroadcastStore> {
        &self.store
    }

    pub fn list_policy(&self) -> ListPolicy {
        self.list_policy
    }

    /// Register or heartbeat a broadcaster.
    ///
    /// An existing id has its stream URL replaced and liveness refreshed;
    /// this is never a conflict.
    pub async fn register(&self, request: RegisterBroadcast) -> Result<UpsertOutcome> {
        let broadcaster_id = validate_broadcaster_id(request.broadcaster_id)?;
        let stream_url = validate_stream_url(request.stream_url)?;

        let outcome = self.store.upsert(&broadcaster_id, &stream_url).await;

        if outcome.created {
            tracing::info!(
                broadcaster_id = %broadcaster_id,
                stream_url = %stream_url,
                "Registered broadcaster"
            );
        } else {
            tracing::debug!(broadcaster_id = %broadcaster_id, "Broadcaster heartbeat");
        }

        Ok(outcome)
    }

    /// Remove a broadcaster
    pub async fn deregister(&self, broadcaster_id: &str) -> Result<()> {
        if !self.store.remove(broadcaster_id).await {
            return Err(RegistryError::broadcast_not_found());
        }

        tracing::info!(broadcaster_id = %broadcaster_id, "Deregistered broadcaster");
        Ok(())
    }

    /// Snapshot of visible broadcasters, optionally narrowed to one status
    pub async fn list(&self, status: Option<BroadcastStatus>) -> Vec<BroadcastRecord> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|r| self.list_policy.admits(r))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect()
    }

    /// Look up one visible broadcaster
    pub async fn get(&self, broadcaster_id: &str) -> Result<BroadcastRecord> {
        self.store
            .get(broadcaster_id)
            .await
            .filter(|r| self.list_policy.admits(r))
            .ok_or_else(RegistryError::broadcast_not_found)
    }

    pub async fn counts(&self) -> StoreCounts {
        self.store.counts().await
    }
}

fn require(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RegistryError::Validation(format!("Missing {}", field))),
    }
}

fn validate_broadcaster_id(value: Option<String>) -> Result<String> {
    let id = require("broadcaster_id", value)?;
    if id.contains('/') {
        return Err(RegistryError::Validation(
            "broadcaster_id must not contain '/'".to_string(),
        ));
    }
    Ok(id)
}

fn validate_stream_url(value: Option<String>) -> Result<String> {
    let raw = require("stream_url", value)?;
    let parsed = Url::parse(&raw)
        .map_err(|e| RegistryError::Validation(format!("Invalid stream_url: {}", e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(RegistryError::Validation(
            "Invalid stream_url: missing host".to_string(),
        ));
    }
    Ok(raw)
}
