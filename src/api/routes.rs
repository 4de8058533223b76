use axum::{
    routing::{get, post, put},
    Router,
};

use crate::server::AppState;

use super::health::{health, stats};
use super::messages::{mark_conversation_read, mark_message_read, send_message};
use super::metrics::prometheus_metrics;
use super::presence::user_presence;
use super::slideshow::{
    get_slideshow, navigate_slideshow, start_slideshow, stop_slideshow, transfer_control,
    update_auto_advance,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Slideshow
                .route(
                    "/conversations/{id}/slideshow",
                    post(start_slideshow).get(get_slideshow).delete(stop_slideshow),
                )
                .route("/conversations/{id}/slideshow/navigate", post(navigate_slideshow))
                .route(
                    "/conversations/{id}/slideshow/transfer-control",
                    post(transfer_control),
                )
                .route(
                    "/conversations/{id}/slideshow/auto-advance",
                    put(update_auto_advance),
                )
                // Messages
                .route("/conversations/{id}/messages", post(send_message))
                .route("/conversations/{id}/read", post(mark_conversation_read))
                .route("/messages/{id}/read", post(mark_message_read))
                // Presence
                .route("/users/{id}/online", get(user_presence)),
        )
}
