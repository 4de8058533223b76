use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slideshow::SlideshowSession;

use super::{ConversationId, MessageId, UserId};

/// A chat message as pushed with `new_message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

fn default_message_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeliveredPayload {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReadPayload {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub reader_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationReadPayload {
    pub conversation_id: ConversationId,
    pub reader_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatePayload {
    pub conversation_id: ConversationId,
    pub current_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTransferredPayload {
    pub conversation_id: ConversationId,
    pub controller_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAdvancePayload {
    pub conversation_id: ConversationId,
    pub auto_advance: bool,
    pub auto_advance_interval: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideshowStoppedPayload {
    pub conversation_id: ConversationId,
    pub stopped_by: UserId,
}

/// Events delivered to clients. The variant name is the wire `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    NewMessage(MessageRecord),
    MessageDelivered(MessageDeliveredPayload),
    MessageRead(MessageReadPayload),
    ConversationRead(ConversationReadPayload),
    SlideshowStarted(SlideshowSession),
    SlideshowNavigate(NavigatePayload),
    SlideshowControlTransferred(ControlTransferredPayload),
    SlideshowAutoAdvanceUpdated(AutoAdvancePayload),
    SlideshowStopped(SlideshowStoppedPayload),
}

/// Payload-free discriminant of [`Event`], used for logging and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    NewMessage,
    MessageDelivered,
    MessageRead,
    ConversationRead,
    SlideshowStarted,
    SlideshowNavigate,
    SlideshowControlTransferred,
    SlideshowAutoAdvanceUpdated,
    SlideshowStopped,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::MessageDelivered => "message_delivered",
            Self::MessageRead => "message_read",
            Self::ConversationRead => "conversation_read",
            Self::SlideshowStarted => "slideshow_started",
            Self::SlideshowNavigate => "slideshow_navigate",
            Self::SlideshowControlTransferred => "slideshow_control_transferred",
            Self::SlideshowAutoAdvanceUpdated => "slideshow_auto_advance_updated",
            Self::SlideshowStopped => "slideshow_stopped",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::NewMessage(_) => EventType::NewMessage,
            Self::MessageDelivered(_) => EventType::MessageDelivered,
            Self::MessageRead(_) => EventType::MessageRead,
            Self::ConversationRead(_) => EventType::ConversationRead,
            Self::SlideshowStarted(_) => EventType::SlideshowStarted,
            Self::SlideshowNavigate(_) => EventType::SlideshowNavigate,
            Self::SlideshowControlTransferred(_) => EventType::SlideshowControlTransferred,
            Self::SlideshowAutoAdvanceUpdated(_) => EventType::SlideshowAutoAdvanceUpdated,
            Self::SlideshowStopped(_) => EventType::SlideshowStopped,
        }
    }
}

/// An event addressed to one user.
///
/// Envelopes are never mutated after construction; the hub serializes each
/// one once and shares the text across all of the recipient's connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub recipient_id: UserId,
    #[serde(flatten)]
    pub event: Event,
}

impl Envelope {
    pub fn new(recipient_id: UserId, event: Event) -> Self {
        Self {
            recipient_id,
            event,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::new(
            7,
            Event::MessageRead(MessageReadPayload {
                message_id: 11,
                conversation_id: 3,
                reader_id: 7,
            }),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "recipient_id": 7,
                "type": "message_read",
                "payload": {"message_id": 11, "conversation_id": 3, "reader_id": 7}
            })
        );
    }

    #[test]
    fn test_event_type_matches_wire_tag() {
        let event = Event::SlideshowNavigate(NavigatePayload {
            conversation_id: 1,
            current_index: 4,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.event_type().as_str());
    }

    #[test]
    fn test_parse_envelope_from_wire() {
        let text = r#"{"recipient_id":2,"type":"conversation_read","payload":{"conversation_id":9,"reader_id":2}}"#;
        let envelope: Envelope = serde_json::from_str(text).unwrap();
        assert_eq!(envelope.recipient_id, 2);
        assert_eq!(envelope.event_type(), EventType::ConversationRead);
    }
}
