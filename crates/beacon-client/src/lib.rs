//! Beacon Client
//!
//! Typed access to the discovery daemon for the two kinds of collaborators:
//!
//! - **Broadcasters** register their stream endpoint, keep it fresh with a
//!   [`Heartbeat`], and deregister on clean shutdown.
//! - **Consumers** list the directory and pick a stream with
//!   [`DiscoveryClient::find`], then connect to it directly.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod heartbeat;

pub use beacon_registry::{BroadcastInfo, BroadcastStatus};
pub use client::DiscoveryClient;
pub use error::{ClientError, Result};
pub use heartbeat::{Heartbeat, HeartbeatHandle};
