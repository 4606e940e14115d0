//! REST API for the broadcast directory

pub mod handlers;
pub mod router;
pub mod state;
