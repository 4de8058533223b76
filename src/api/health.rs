//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::connection_manager::ConnectionStats;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: ConnectionStats,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionStats,
    pub online_users: Vec<i64>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        connections: state.connection_manager.stats(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut online_users = state.connection_manager.online_users();
    online_users.sort_unstable();

    Json(StatsResponse {
        connections: state.connection_manager.stats(),
        online_users,
    })
}
