// Shared infrastructure
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod telemetry;

// Hub core
pub mod connection_manager;
pub mod protocol;
pub mod websocket;

// Domain services
pub mod messaging;
pub mod slideshow;

// Application layer
pub mod api;
pub mod server;
pub mod shutdown;
