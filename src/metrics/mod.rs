//! Prometheus metrics for the realtime hub.
//!
//! This module provides metrics for monitoring the hub:
//! - Connection metrics (active connections, online users, lifetimes)
//! - Delivery metrics (frames enqueued by event type, slow-consumer disconnects)
//! - Slideshow transition metrics

mod helpers;

pub use helpers::{encode_metrics, HubMetrics, SlideshowMetrics, WsConnectionMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "hub";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Total number of active WebSocket connections
    pub static ref CONNECTIONS_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_connections_total", METRIC_PREFIX),
        "Total number of active WebSocket connections"
    ).unwrap();

    /// Number of users with at least one connection
    pub static ref USERS_ONLINE: IntGauge = register_int_gauge!(
        format!("{}_users_online", METRIC_PREFIX),
        "Number of users with at least one live connection"
    ).unwrap();

    /// WebSocket connections opened
    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();

    /// WebSocket connections closed
    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    /// Upgrade requests rejected before a connection was created
    pub static ref WS_UPGRADES_REJECTED: IntCounterVec = register_int_counter_vec!(
        format!("{}_ws_upgrades_rejected_total", METRIC_PREFIX),
        "Total WebSocket upgrade requests rejected",
        &["reason"]
    ).unwrap();

    /// Connection lifetime
    pub static ref WS_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_ws_connection_duration_seconds", METRIC_PREFIX),
        "WebSocket connection duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Frames accepted into outbound queues, by event type
    pub static ref EVENTS_ENQUEUED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_enqueued_total", METRIC_PREFIX),
        "Total event frames accepted into connection queues",
        &["type"]
    ).unwrap();

    /// Connections dropped because their outbound queue was full
    pub static ref SLOW_CONSUMER_DISCONNECTS: IntCounter = register_int_counter!(
        format!("{}_slow_consumer_disconnects_total", METRIC_PREFIX),
        "Total connections disconnected because the outbound queue was full"
    ).unwrap();

    // ============================================================================
    // Slideshow Metrics
    // ============================================================================

    /// Slideshow transitions by kind and outcome
    pub static ref SLIDESHOW_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_slideshow_transitions_total", METRIC_PREFIX),
        "Total slideshow transitions",
        &["transition", "outcome"]
    ).unwrap();
}
