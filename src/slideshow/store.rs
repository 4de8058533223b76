//! Slideshow session persistence

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::protocol::{ConversationId, UserId};
use crate::store::{StoreError, StoreResult};

use super::types::SlideshowSession;

/// Storage for slideshow sessions, one row per conversation.
///
/// Updates are plain writes: two racing controller actions resolve as
/// last-write-wins.
#[async_trait]
pub trait SlideshowStore: Send + Sync {
    /// Insert a new session. Fails with `AlreadyExists`, never overwrites.
    async fn create(&self, session: SlideshowSession) -> StoreResult<SlideshowSession>;

    async fn get(&self, conversation_id: ConversationId) -> StoreResult<Option<SlideshowSession>>;

    async fn update_index(
        &self,
        conversation_id: ConversationId,
        index: u32,
    ) -> StoreResult<SlideshowSession>;

    async fn update_controller(
        &self,
        conversation_id: ConversationId,
        controller_user_id: UserId,
    ) -> StoreResult<SlideshowSession>;

    async fn update_auto_advance(
        &self,
        conversation_id: ConversationId,
        auto_advance: bool,
        interval: u32,
    ) -> StoreResult<SlideshowSession>;

    /// Delete the session. Returns whether one existed.
    async fn delete(&self, conversation_id: ConversationId) -> StoreResult<bool>;
}

/// In-memory slideshow storage
#[derive(Default)]
pub struct MemorySlideshowStore {
    sessions: DashMap<ConversationId, SlideshowSession>,
}

impl MemorySlideshowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    fn modify(
        &self,
        conversation_id: ConversationId,
        apply: impl FnOnce(&mut SlideshowSession),
    ) -> StoreResult<SlideshowSession> {
        let mut session = self.sessions.get_mut(&conversation_id).ok_or_else(|| {
            StoreError::NotFound(format!("no slideshow for conversation {}", conversation_id))
        })?;
        apply(&mut session);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }
}

#[async_trait]
impl SlideshowStore for MemorySlideshowStore {
    async fn create(&self, session: SlideshowSession) -> StoreResult<SlideshowSession> {
        match self.sessions.entry(session.conversation_id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(format!(
                "slideshow already active for conversation {}",
                session.conversation_id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn get(&self, conversation_id: ConversationId) -> StoreResult<Option<SlideshowSession>> {
        Ok(self.sessions.get(&conversation_id).map(|s| s.clone()))
    }

    async fn update_index(
        &self,
        conversation_id: ConversationId,
        index: u32,
    ) -> StoreResult<SlideshowSession> {
        self.modify(conversation_id, |s| s.current_index = index)
    }

    async fn update_controller(
        &self,
        conversation_id: ConversationId,
        controller_user_id: UserId,
    ) -> StoreResult<SlideshowSession> {
        self.modify(conversation_id, |s| s.controller_user_id = controller_user_id)
    }

    async fn update_auto_advance(
        &self,
        conversation_id: ConversationId,
        auto_advance: bool,
        interval: u32,
    ) -> StoreResult<SlideshowSession> {
        self.modify(conversation_id, |s| {
            s.auto_advance = auto_advance;
            s.auto_advance_interval = interval;
        })
    }

    async fn delete(&self, conversation_id: ConversationId) -> StoreResult<bool> {
        Ok(self.sessions.remove(&conversation_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slideshow::StartSlideshowRequest;

    fn session(conversation_id: ConversationId) -> SlideshowSession {
        StartSlideshowRequest::personal(vec![1, 2])
            .into_session(conversation_id, 1)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_never_overwrites() {
        let store = MemorySlideshowStore::new();
        store.create(session(1)).await.unwrap();

        let mut other = session(1);
        other.controller_user_id = 2;
        assert!(matches!(
            store.create(other).await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.get(1).await.unwrap().unwrap().controller_user_id, 1);
    }

    #[tokio::test]
    async fn test_update_missing_session() {
        let store = MemorySlideshowStore::new();
        assert!(matches!(
            store.update_index(9, 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemorySlideshowStore::new();
        store.create(session(1)).await.unwrap();

        let updated = store.update_index(1, 1).await.unwrap();
        assert_eq!(updated.current_index, 1);

        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert_eq!(store.count(), 0);
    }
}
