//! Beacon Registry - Broadcast directory core
//!
//! This crate provides the discovery directory used by broadcasters and consumers:
//!
//! - **BroadcastStore**: Authoritative in-memory table of broadcasters and their liveness
//! - **LivenessMonitor**: Periodic sweep demoting or evicting broadcasters that stopped heartbeating
//! - **RegistryService**: Register / deregister / list operations with input validation
//!
//! ## Concurrency
//!
//! All mutation goes through the store, which guards its table with a single
//! `RwLock`. The monitor performs each sweep under one write acquisition, so a
//! register arriving mid-sweep is ordered strictly before or after it.
//!
//! The crate is transport-agnostic; `beacon-daemon` exposes it over HTTP.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod clock;
pub mod error;
pub mod monitor;
pub mod record;
pub mod service;
pub mod store;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RegistryError, Result};
pub use monitor::{LivenessMonitor, LivenessPolicy, StalePolicy, SweepReport};
pub use record::{BroadcastInfo, BroadcastRecord, BroadcastStatus};
pub use service::{ListPolicy, RegisterBroadcast, RegistryService};
pub use store::{BroadcastStore, StoreCounts, UpsertOutcome};
