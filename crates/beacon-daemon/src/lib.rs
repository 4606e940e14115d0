//! Beacon Daemon library
//!
//! This module provides the core components for the discovery daemon:
//! - REST API handlers for the broadcast directory
//! - Configuration loading
//! - Server lifecycle management (liveness monitor, graceful shutdown)

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::create_router;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
