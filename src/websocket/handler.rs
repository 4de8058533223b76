use axum::{
    extract::{State, WebSocketUpgrade},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::metrics::WsConnectionMetrics;
use crate::server::AppState;

use super::connection::run_connection;

/// WebSocket upgrade handler
#[tracing::instrument(
    name = "ws.upgrade",
    skip_all,
    fields(user_id = tracing::field::Empty)
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    headers: HeaderMap,
) -> Response {
    let user_id = match auth {
        Ok(AuthUser(user_id)) => user_id,
        Err(e) => {
            WsConnectionMetrics::record_rejected("auth");
            return e.into_response();
        }
    };
    tracing::Span::current().record("user_id", user_id);

    if let Some(origin) = headers.get(header::ORIGIN) {
        let allowed = origin
            .to_str()
            .map(|o| state.settings.server.is_origin_allowed(o))
            .unwrap_or(false);

        if !allowed {
            tracing::warn!(origin = ?origin, "WebSocket upgrade from disallowed origin");
            WsConnectionMetrics::record_rejected("origin");
            return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }

    tracing::info!(user_id = user_id, "WebSocket upgrade requested");

    ws.on_failed_upgrade(log_failed_upgrade)
        .on_upgrade(move |socket| run_connection(socket, state, user_id))
}

/// The handshake response was sent but the connection could not be taken over
fn log_failed_upgrade(error: axum::Error) {
    tracing::warn!(error = %error, "WebSocket upgrade failed");
    WsConnectionMetrics::record_rejected("upgrade");
}
