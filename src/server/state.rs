use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::config::Settings;
use crate::connection_manager::{Broadcaster, ConnectionManager};
use crate::messaging::{MemoryMessageStore, MessageService, MessageStore};
use crate::slideshow::{MemorySlideshowStore, SlideshowCoordinator, SlideshowStore};
use crate::store::{ConversationDirectory, MemoryConversationDirectory};

/// Persistence backends the hub writes through
#[derive(Clone)]
pub struct Stores {
    pub conversations: Arc<dyn ConversationDirectory>,
    pub slideshows: Arc<dyn SlideshowStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            conversations: Arc::new(MemoryConversationDirectory::new()),
            slideshows: Arc::new(MemorySlideshowStore::new()),
            messages: Arc::new(MemoryMessageStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub connection_manager: Arc<ConnectionManager>,
    pub slideshow: Arc<SlideshowCoordinator>,
    pub messages: Arc<MessageService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self::with_stores(settings, Stores::in_memory())
    }

    pub fn with_stores(settings: Settings, stores: Stores) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let connection_manager = Arc::new(ConnectionManager::new());
        let broadcaster: Arc<dyn Broadcaster> = connection_manager.clone();

        let slideshow = Arc::new(SlideshowCoordinator::new(
            stores.slideshows,
            stores.conversations.clone(),
            broadcaster.clone(),
        ));
        let messages = Arc::new(MessageService::new(
            stores.messages,
            stores.conversations,
            broadcaster,
        ));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            connection_manager,
            slideshow,
            messages,
            start_time: Instant::now(),
        }
    }
}
