//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::protocol::EventType;

use super::{
    CONNECTIONS_TOTAL, EVENTS_ENQUEUED_TOTAL, SLIDESHOW_TRANSITIONS_TOTAL,
    SLOW_CONSUMER_DISCONNECTS, USERS_ONLINE, WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_OPENED,
    WS_CONNECTION_DURATION, WS_UPGRADES_REJECTED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording registry metrics
pub struct HubMetrics;

impl HubMetrics {
    /// Record a registered connection
    pub fn record_registered(came_online: bool) {
        CONNECTIONS_TOTAL.inc();
        if came_online {
            USERS_ONLINE.inc();
        }
    }

    /// Record an unregistered connection
    pub fn record_unregistered(went_offline: bool) {
        CONNECTIONS_TOTAL.dec();
        if went_offline {
            USERS_ONLINE.dec();
        }
    }

    /// Record frames accepted for one event
    pub fn record_enqueued(event_type: EventType, count: u64) {
        if count > 0 {
            EVENTS_ENQUEUED_TOTAL
                .with_label_values(&[event_type.as_str()])
                .inc_by(count);
        }
    }

    /// Record a slow-consumer disconnect
    pub fn record_slow_disconnect() {
        SLOW_CONSUMER_DISCONNECTS.inc();
    }
}

/// Helper struct for recording socket lifecycle metrics
pub struct WsConnectionMetrics;

impl WsConnectionMetrics {
    pub fn record_opened() {
        WS_CONNECTIONS_OPENED.inc();
    }

    pub fn record_closed(duration_secs: f64) {
        WS_CONNECTIONS_CLOSED.inc();
        WS_CONNECTION_DURATION.observe(duration_secs);
    }

    /// Record an upgrade rejected before a connection existed
    pub fn record_rejected(reason: &str) {
        WS_UPGRADES_REJECTED.with_label_values(&[reason]).inc();
    }
}

/// Helper struct for recording slideshow metrics
pub struct SlideshowMetrics;

impl SlideshowMetrics {
    pub fn record_transition(transition: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "rejected" };
        SLIDESHOW_TRANSITIONS_TOTAL
            .with_label_values(&[transition, outcome])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_recorded_metrics() {
        SlideshowMetrics::record_transition("start", true);
        HubMetrics::record_enqueued(EventType::NewMessage, 1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("hub_slideshow_transitions_total"));
        assert!(output.contains("hub_events_enqueued_total"));
    }
}
