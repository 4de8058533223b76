use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use chrono::Utc;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::connection_manager::ConnectionHandle;
use crate::metrics::WsConnectionMetrics;
use crate::protocol::UserId;
use crate::server::AppState;

use super::message::OutboundMessage;

/// How long teardown waits for the write loop to flush its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Drive an upgraded socket until either side gives up.
///
/// The write loop runs as its own task and owns the sink; the read loop runs
/// here. Both stop on the connection's cancellation token, and whichever ends
/// first cancels it for the other.
#[tracing::instrument(
    name = "ws.connection",
    skip(socket, state),
    fields(otel.kind = "server")
)]
pub async fn run_connection(socket: WebSocket, state: AppState, user_id: UserId) {
    let ws_config = &state.settings.websocket;

    let (tx, rx) = mpsc::channel::<OutboundMessage>(ws_config.outbound_buffer_size.max(1));
    let handle = state.connection_manager.register(user_id, tx);
    let connection_id = handle.id;
    WsConnectionMetrics::record_opened();

    tracing::info!(
        connection_id = %connection_id,
        user_id = user_id,
        "WebSocket connection established"
    );

    let (ws_sender, ws_receiver) = socket.split();

    let mut writer = tokio::spawn(write_loop(
        ws_sender,
        rx,
        handle.cancellation_token(),
        ws_config.heartbeat(),
    ));

    let reason = read_loop(ws_receiver, &handle, ws_config.idle_timeout()).await;

    handle.close();
    state.connection_manager.unregister(user_id, connection_id);

    if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Write loop did not finish, aborting");
        writer.abort();
    }

    let duration = (Utc::now() - handle.connected_at).num_milliseconds() as f64 / 1000.0;
    WsConnectionMetrics::record_closed(duration);

    tracing::info!(
        connection_id = %connection_id,
        user_id = user_id,
        reason = reason,
        duration_secs = duration,
        last_activity = %handle.last_activity(),
        "WebSocket connection closed"
    );
}

/// Read until error, close, end of stream, idle timeout, or cancellation.
/// Returns why the loop ended.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    handle: &Arc<ConnectionHandle>,
    idle_timeout: Duration,
) -> &'static str {
    let cancel = handle.cancellation_token();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return "cancelled",
            next = tokio::time::timeout(idle_timeout, receiver.next()) => next,
        };

        let msg = match next {
            Err(_) => return "idle_timeout",
            Ok(None) => return "stream_ended",
            Ok(Some(Err(e))) => {
                tracing::warn!(connection_id = %handle.id, error = %e, "WebSocket receive error");
                return "receive_error";
            }
            Ok(Some(Ok(msg))) => msg,
        };

        handle.update_activity();
        match msg {
            Message::Text(text) => {
                tracing::debug!(
                    connection_id = %handle.id,
                    len = text.len(),
                    "Ignoring client text frame"
                );
            }
            Message::Binary(data) => {
                tracing::debug!(
                    connection_id = %handle.id,
                    len = data.len(),
                    "Ignoring client binary frame"
                );
            }
            // Pongs to client pings are written by the protocol layer
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(frame) => {
                tracing::debug!(connection_id = %handle.id, frame = ?frame, "Received close frame");
                return "client_closed";
            }
        }
    }
}

/// Drain the outbound queue onto the socket and keep it alive with pings.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundMessage>,
    cancel: CancellationToken,
    heartbeat: Duration,
) {
    let mut ping = tokio::time::interval(heartbeat);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ping.tick().await;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(msg) => sender.send(Message::Text(msg.text().into())).await,
                None => break,
            },
            _ = ping.tick() => sender.send(Message::Ping(Default::default())).await,
        };

        if let Err(e) = result {
            tracing::debug!(error = %e, "WebSocket write failed");
            cancel.cancel();
            return;
        }
    }

    cancel.cancel();
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: close_code::AWAY,
            reason: "connection closed".into(),
        })))
        .await;
    let _ = sender.close().await;
}
