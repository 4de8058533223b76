//! Connection handle and related types

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::UserId;
use crate::websocket::OutboundMessage;

/// Handle for a single WebSocket connection.
///
/// The registry owns one `Arc` of this per live connection; the socket tasks
/// own the receiving half of the queue and a clone of the cancellation token.
pub struct ConnectionHandle {
    pub id: Uuid,
    pub user_id: UserId,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundMessage>,
    cancel: CancellationToken,
    /// Last activity timestamp (Unix seconds) - using AtomicI64 for lock-free updates
    last_activity: AtomicI64,
}

impl ConnectionHandle {
    pub fn new(user_id: UserId, sender: mpsc::Sender<OutboundMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            connected_at: now,
            sender,
            cancel: CancellationToken::new(),
            last_activity: AtomicI64::new(now.timestamp()),
        }
    }

    pub fn update_activity(&self) {
        self.last_activity
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.last_activity.load(Ordering::Relaxed), 0)
            .unwrap_or_else(Utc::now)
    }

    /// Enqueue without waiting. A full queue is reported, never awaited.
    pub fn try_send(&self, message: OutboundMessage) -> Result<(), EnqueueError> {
        if self.cancel.is_cancelled() {
            return Err(EnqueueError::Closed);
        }

        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Token shared with the socket tasks; cancelling it tears the connection down
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signal both socket loops to stop
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Reasons a non-blocking enqueue can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("outbound queue is full")]
    Full,
    #[error("connection is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ConversationReadPayload, Envelope, Event};

    fn message() -> OutboundMessage {
        let envelope = Envelope::new(
            1,
            Event::ConversationRead(ConversationReadPayload {
                conversation_id: 1,
                reader_id: 2,
            }),
        );
        OutboundMessage::preserialized(&envelope).unwrap()
    }

    #[test]
    fn test_try_send_reports_full_queue() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(1, tx);

        assert_eq!(handle.try_send(message()), Ok(()));
        assert_eq!(handle.try_send(message()), Err(EnqueueError::Full));
    }

    #[test]
    fn test_try_send_after_close() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(1, tx);

        handle.close();
        assert!(handle.is_closed());
        assert_eq!(handle.try_send(message()), Err(EnqueueError::Closed));
    }

    #[test]
    fn test_try_send_with_dropped_receiver() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(1, tx);
        drop(rx);

        assert_eq!(handle.try_send(message()), Err(EnqueueError::Closed));
    }

    #[test]
    fn test_activity_starts_at_connect_and_moves_forward() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(1, tx);
        assert_eq!(handle.last_activity().timestamp(), handle.connected_at.timestamp());

        handle.update_activity();
        assert!(handle.last_activity().timestamp() >= handle.connected_at.timestamp());
        assert!(handle.last_activity() <= Utc::now());
    }
}
