//! API request handlers

mod broadcasts;
mod health;

pub use broadcasts::*;
pub use health::*;
