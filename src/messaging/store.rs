use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::protocol::{ConversationId, MessageId, MessageRecord, UserId};
use crate::store::{StoreError, StoreResult};

/// Storage for chat messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: String,
        message_type: String,
    ) -> StoreResult<MessageRecord>;

    async fn get(&self, message_id: MessageId) -> StoreResult<Option<MessageRecord>>;

    async fn mark_delivered(&self, message_id: MessageId, at: DateTime<Utc>) -> StoreResult<MessageRecord>;

    /// Set the read time if unset. The flag is false when the message was
    /// already read, so concurrent callers see exactly one `true`.
    async fn mark_read(&self, message_id: MessageId, at: DateTime<Utc>) -> StoreResult<(MessageRecord, bool)>;

    /// Mark every unread message addressed to `reader_id` as read.
    /// Returns the ids that changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<MessageId>>;
}

/// In-memory message storage
pub struct MemoryMessageStore {
    messages: DashMap<MessageId, MessageRecord>,
    next_id: AtomicI64,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self {
            messages: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    fn modify(
        &self,
        message_id: MessageId,
        apply: impl FnOnce(&mut MessageRecord),
    ) -> StoreResult<MessageRecord> {
        let mut message = self
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| StoreError::NotFound(format!("message {} not found", message_id)))?;
        apply(&mut message);
        Ok(message.clone())
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: String,
        message_type: String,
    ) -> StoreResult<MessageRecord> {
        let record = MessageRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            conversation_id,
            sender_id,
            content,
            message_type,
            created_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        self.messages.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, message_id: MessageId) -> StoreResult<Option<MessageRecord>> {
        Ok(self.messages.get(&message_id).map(|m| m.clone()))
    }

    async fn mark_delivered(&self, message_id: MessageId, at: DateTime<Utc>) -> StoreResult<MessageRecord> {
        self.modify(message_id, |m| {
            m.delivered_at.get_or_insert(at);
        })
    }

    async fn mark_read(&self, message_id: MessageId, at: DateTime<Utc>) -> StoreResult<(MessageRecord, bool)> {
        let mut changed = false;
        let record = self.modify(message_id, |m| {
            if m.read_at.is_none() {
                m.delivered_at.get_or_insert(at);
                m.read_at = Some(at);
                changed = true;
            }
        })?;
        Ok((record, changed))
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<MessageId>> {
        let mut changed = Vec::new();
        for mut entry in self.messages.iter_mut() {
            let m = entry.value_mut();
            if m.conversation_id == conversation_id && m.sender_id != reader_id && m.read_at.is_none() {
                m.delivered_at.get_or_insert(at);
                m.read_at = Some(at);
                changed.push(m.id);
            }
        }
        changed.sort_unstable();
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryMessageStore::new();
        let a = assert_ok!(store.insert(1, 1, "hi".into(), "text".into()).await);
        let b = assert_ok!(store.insert(1, 2, "yo".into(), "text".into()).await);
        assert!(b.id > a.id);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_reports_change_once() {
        let store = MemoryMessageStore::new();
        let m = assert_ok!(store.insert(1, 1, "hi".into(), "text".into()).await);

        let (first, changed) = assert_ok!(store.mark_read(m.id, Utc::now()).await);
        assert!(changed);
        let (second, changed) = assert_ok!(store.mark_read(m.id, Utc::now()).await);
        assert!(!changed);
        assert_eq!(first.read_at, second.read_at);
    }

    #[tokio::test]
    async fn test_mark_unknown_message() {
        let store = MemoryMessageStore::new();
        assert_err!(store.mark_read(404, Utc::now()).await);
        assert_err!(store.mark_delivered(404, Utc::now()).await);
    }

    #[tokio::test]
    async fn test_mark_conversation_read_skips_own_messages() {
        let store = MemoryMessageStore::new();
        let mine = store.insert(1, 1, "a".into(), "text".into()).await.unwrap();
        let theirs = store.insert(1, 2, "b".into(), "text".into()).await.unwrap();
        store.insert(2, 2, "other".into(), "text".into()).await.unwrap();

        let changed = store.mark_conversation_read(1, 1, Utc::now()).await.unwrap();
        assert_eq!(changed, vec![theirs.id]);
        assert!(store.get(mine.id).await.unwrap().unwrap().read_at.is_none());

        let again = store.mark_conversation_read(1, 1, Utc::now()).await.unwrap();
        assert!(again.is_empty());
    }
}
