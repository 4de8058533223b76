use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::protocol::{ConversationId, UserId};

use super::StoreResult;

/// The two members of a one-to-one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub user1_id: UserId,
    pub user2_id: UserId,
}

impl Participants {
    pub fn new(user1_id: UserId, user2_id: UserId) -> Self {
        Self { user1_id, user2_id }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The participant who is not `user_id`, if `user_id` is a participant
    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }

    pub fn as_vec(&self) -> Vec<UserId> {
        vec![self.user1_id, self.user2_id]
    }
}

/// Lookup of conversation membership
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    /// Participants of a conversation, `None` if it does not exist
    async fn participants(&self, conversation_id: ConversationId) -> StoreResult<Option<Participants>>;
}

/// In-memory conversation directory
#[derive(Default)]
pub struct MemoryConversationDirectory {
    conversations: DashMap<ConversationId, Participants>,
}

impl MemoryConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conversation_id: ConversationId, participants: Participants) {
        self.conversations.insert(conversation_id, participants);
    }
}

#[async_trait]
impl ConversationDirectory for MemoryConversationDirectory {
    async fn participants(&self, conversation_id: ConversationId) -> StoreResult<Option<Participants>> {
        Ok(self.conversations.get(&conversation_id).map(|p| *p))
    }
}
