//! Connection registry for WebSocket connections
//!
//! This module provides:
//! - Connection handles with a bounded outbound queue
//! - The user -> connections index used for presence and delivery
//! - The `Broadcaster` capability consumed by REST handlers

mod broadcaster;
mod registry;
mod stats;
mod types;

pub use broadcaster::Broadcaster;
pub use registry::ConnectionManager;
pub use stats::{ConnectionStats, UserPresence};
pub use types::{ConnectionHandle, EnqueueError};
