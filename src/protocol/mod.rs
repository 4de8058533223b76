//! Delivery protocol: the closed set of events pushed to connected clients.
//!
//! Every event travels inside an [`Envelope`] serialized as
//! `{"recipient_id": <int>, "type": "<event>", "payload": {...}}`.

mod event;

pub use event::{
    AutoAdvancePayload, ControlTransferredPayload, ConversationReadPayload, Envelope, Event,
    EventType, MessageDeliveredPayload, MessageReadPayload, MessageRecord, NavigatePayload,
    SlideshowStoppedPayload,
};

/// Numeric user identifier as issued by the auth collaborator.
pub type UserId = i64;

/// Numeric conversation identifier.
pub type ConversationId = i64;

/// Numeric message identifier.
pub type MessageId = i64;
