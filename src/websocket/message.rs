use std::sync::Arc;

use crate::protocol::{Envelope, EventType};

/// A frame waiting in a connection's outbound queue.
///
/// The envelope is serialized once by the hub and the text is shared by
/// every connection of the recipient, so cloning is a refcount bump.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    event_type: EventType,
    text: Arc<str>,
}

impl OutboundMessage {
    /// Serialize an envelope for delivery
    pub fn preserialized(envelope: &Envelope) -> Result<Self, serde_json::Error> {
        let text = envelope.to_json()?;
        Ok(Self {
            event_type: envelope.event_type(),
            text: Arc::from(text),
        })
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ConversationReadPayload, Event};

    #[test]
    fn test_preserialized_shares_text() {
        let envelope = Envelope::new(
            1,
            Event::ConversationRead(ConversationReadPayload {
                conversation_id: 5,
                reader_id: 2,
            }),
        );
        let message = OutboundMessage::preserialized(&envelope).unwrap();
        let copy = message.clone();

        assert_eq!(message.event_type(), EventType::ConversationRead);
        assert!(std::ptr::eq(message.text(), copy.text()));
        assert!(message.text().contains("\"type\":\"conversation_read\""));
    }
}
