use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::connection_manager::Broadcaster;
use crate::protocol::{
    ConversationId, ConversationReadPayload, Envelope, Event, MessageDeliveredPayload, MessageId,
    MessageReadPayload, MessageRecord, UserId,
};
use crate::store::{ConversationDirectory, Participants};

use super::store::MessageStore;
use super::{MessagingError, MessagingResult};

pub const MAX_CONTENT_LENGTH: usize = 4000;

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

fn default_message_type() -> String {
    "text".to_string()
}

impl SendMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: default_message_type(),
        }
    }
}

/// Persists chat messages and pushes delivery and read receipts.
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationDirectory>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationDirectory>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            messages,
            conversations,
            broadcaster,
        }
    }

    /// Store a message and push it to the other participant.
    ///
    /// If the recipient holds a live connection at send time the message is
    /// marked delivered and the sender receives `message_delivered`.
    #[tracing::instrument(name = "messages.send", skip(self, request))]
    pub async fn send_message(
        &self,
        sender_id: UserId,
        conversation_id: ConversationId,
        request: SendMessageRequest,
    ) -> MessagingResult<MessageRecord> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(MessagingError::BadRequest("message content is empty".into()));
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(MessagingError::BadRequest(format!(
                "message content exceeds {} characters",
                MAX_CONTENT_LENGTH
            )));
        }

        let participants = self.authorize(sender_id, conversation_id).await?;
        let recipient_id = participants
            .other(sender_id)
            .ok_or_else(|| MessagingError::Forbidden("not a participant".into()))?;

        let mut message = self
            .messages
            .insert(conversation_id, sender_id, content.to_string(), request.message_type)
            .await?;

        let recipient_online = self.broadcaster.is_user_online(recipient_id);
        self.broadcaster
            .broadcast(Envelope::new(recipient_id, Event::NewMessage(message.clone())));

        if recipient_online {
            match self.messages.mark_delivered(message.id, Utc::now()).await {
                Ok(updated) => {
                    message = updated;
                    self.broadcaster.broadcast(Envelope::new(
                        sender_id,
                        Event::MessageDelivered(MessageDeliveredPayload {
                            message_id: message.id,
                            conversation_id,
                        }),
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        message_id = message.id,
                        error = %e,
                        "Failed to mark message delivered"
                    );
                }
            }
        }

        tracing::debug!(
            message_id = message.id,
            recipient_id = recipient_id,
            recipient_online = recipient_online,
            "Message sent"
        );

        Ok(message)
    }

    /// Mark one message read. Only the recipient may do this; the original
    /// sender is notified the first time.
    #[tracing::instrument(name = "messages.mark_read", skip(self))]
    pub async fn mark_read(&self, reader_id: UserId, message_id: MessageId) -> MessagingResult<MessageRecord> {
        let message = self
            .messages
            .get(message_id)
            .await?
            .ok_or_else(|| MessagingError::NotFound(format!("message {} not found", message_id)))?;

        self.authorize(reader_id, message.conversation_id).await?;
        if message.sender_id == reader_id {
            return Err(MessagingError::BadRequest(
                "cannot mark your own message as read".into(),
            ));
        }
        if message.read_at.is_some() {
            return Ok(message);
        }

        let (updated, changed) = self.messages.mark_read(message_id, Utc::now()).await?;
        if !changed {
            return Ok(updated);
        }

        self.broadcaster.broadcast(Envelope::new(
            updated.sender_id,
            Event::MessageRead(MessageReadPayload {
                message_id,
                conversation_id: updated.conversation_id,
                reader_id,
            }),
        ));

        Ok(updated)
    }

    /// Mark everything addressed to `reader_id` in a conversation as read.
    /// Returns the ids that changed; the other participant is notified only
    /// when something did.
    #[tracing::instrument(name = "messages.mark_conversation_read", skip(self))]
    pub async fn mark_conversation_read(
        &self,
        reader_id: UserId,
        conversation_id: ConversationId,
    ) -> MessagingResult<Vec<MessageId>> {
        let participants = self.authorize(reader_id, conversation_id).await?;
        let changed = self
            .messages
            .mark_conversation_read(conversation_id, reader_id, Utc::now())
            .await?;

        if !changed.is_empty() {
            if let Some(other) = participants.other(reader_id) {
                self.broadcaster.broadcast(Envelope::new(
                    other,
                    Event::ConversationRead(ConversationReadPayload {
                        conversation_id,
                        reader_id,
                    }),
                ));
            }
        }

        Ok(changed)
    }

    async fn authorize(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> MessagingResult<Participants> {
        let participants = self
            .conversations
            .participants(conversation_id)
            .await?
            .ok_or_else(|| {
                MessagingError::NotFound(format!("conversation {} not found", conversation_id))
            })?;

        if !participants.contains(user_id) {
            return Err(MessagingError::Forbidden(
                "not a participant in this conversation".into(),
            ));
        }
        Ok(participants)
    }
}
