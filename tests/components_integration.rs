//! Cross-component integration tests
//!
//! These tests wire the real registry, coordinator and message service
//! together over in-memory stores, without starting a server.

use std::sync::Arc;

use tokio::sync::mpsc;

use realtime_hub::connection_manager::{Broadcaster, ConnectionManager};
use realtime_hub::messaging::{MemoryMessageStore, MessageService, MessageStore, SendMessageRequest};
use realtime_hub::protocol::{Envelope, Event, EventType, MessageDeliveredPayload};
use realtime_hub::slideshow::{
    MemorySlideshowStore, SlideshowCoordinator, SlideshowError, SlideshowStore,
    StartSlideshowRequest,
};
use realtime_hub::store::{MemoryConversationDirectory, Participants};
use realtime_hub::websocket::OutboundMessage;

const ALICE: i64 = 1;
const BOB: i64 = 2;
const CONVERSATION: i64 = 100;

/// Create a full test environment with all components
fn create_test_environment() -> TestEnvironment {
    let connection_manager = Arc::new(ConnectionManager::new());
    let broadcaster: Arc<dyn Broadcaster> = connection_manager.clone();

    let conversations = Arc::new(MemoryConversationDirectory::new());
    conversations.insert(CONVERSATION, Participants::new(ALICE, BOB));

    let slideshow_store = Arc::new(MemorySlideshowStore::new());
    let message_store = Arc::new(MemoryMessageStore::new());

    let slideshow = Arc::new(SlideshowCoordinator::new(
        slideshow_store.clone(),
        conversations.clone(),
        broadcaster.clone(),
    ));
    let messages = Arc::new(MessageService::new(
        message_store.clone(),
        conversations,
        broadcaster,
    ));

    TestEnvironment {
        connection_manager,
        slideshow,
        slideshow_store,
        messages,
        message_store,
    }
}

struct TestEnvironment {
    connection_manager: Arc<ConnectionManager>,
    slideshow: Arc<SlideshowCoordinator>,
    slideshow_store: Arc<MemorySlideshowStore>,
    messages: Arc<MessageService>,
    message_store: Arc<MemoryMessageStore>,
}

impl TestEnvironment {
    fn connect(&self, user_id: i64) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(32);
        self.connection_manager.register(user_id, tx);
        rx
    }
}

/// Everything queued so far, as parsed envelopes
fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<Envelope> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        out.push(serde_json::from_str(message.text()).unwrap());
    }
    out
}

fn types(envelopes: &[Envelope]) -> Vec<EventType> {
    envelopes.iter().map(|e| e.event_type()).collect()
}

// =============================================================================
// Message Delivery Tests
// =============================================================================

mod messaging_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_to_online_recipient() {
        let env = create_test_environment();
        let mut alice = env.connect(ALICE);
        let mut bob = env.connect(BOB);

        let message = env
            .messages
            .send_message(ALICE, CONVERSATION, SendMessageRequest::text("hi bob"))
            .await
            .unwrap();

        let to_bob = drain(&mut bob);
        assert_eq!(types(&to_bob), vec![EventType::NewMessage]);
        match &to_bob[0].event {
            Event::NewMessage(record) => assert_eq!(record.content, "hi bob"),
            other => panic!("unexpected event {:?}", other),
        }

        let to_alice = drain(&mut alice);
        assert_eq!(
            to_alice[0].event,
            Event::MessageDelivered(MessageDeliveredPayload {
                message_id: message.id,
                conversation_id: CONVERSATION,
            })
        );
        assert!(message.delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_send_to_offline_recipient() {
        let env = create_test_environment();
        let mut alice = env.connect(ALICE);

        let message = env
            .messages
            .send_message(ALICE, CONVERSATION, SendMessageRequest::text("anyone?"))
            .await
            .unwrap();

        assert!(drain(&mut alice).is_empty());
        let stored = env.message_store.get(message.id).await.unwrap().unwrap();
        assert!(stored.delivered_at.is_none());
    }

    #[tokio::test]
    async fn test_read_receipts_reach_sender() {
        let env = create_test_environment();
        let mut alice = env.connect(ALICE);

        let first = env
            .messages
            .send_message(ALICE, CONVERSATION, SendMessageRequest::text("one"))
            .await
            .unwrap();
        env.messages
            .send_message(ALICE, CONVERSATION, SendMessageRequest::text("two"))
            .await
            .unwrap();

        env.messages.mark_read(BOB, first.id).await.unwrap();
        let changed = env
            .messages
            .mark_conversation_read(BOB, CONVERSATION)
            .await
            .unwrap();
        assert_eq!(changed.len(), 1);

        assert_eq!(
            types(&drain(&mut alice)),
            vec![EventType::MessageRead, EventType::ConversationRead]
        );
    }
}

// =============================================================================
// Slideshow Tests
// =============================================================================

mod slideshow_tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle_notifies_both_participants() {
        let env = create_test_environment();
        let mut alice = env.connect(ALICE);
        let mut bob = env.connect(BOB);

        env.slideshow
            .start(ALICE, CONVERSATION, StartSlideshowRequest::personal(vec![7, 8, 9]))
            .await
            .unwrap();
        env.slideshow.navigate(ALICE, CONVERSATION, 2).await.unwrap();
        env.slideshow.transfer_control(ALICE, CONVERSATION).await.unwrap();
        env.slideshow
            .update_auto_advance(BOB, CONVERSATION, true, Some(10))
            .await
            .unwrap();
        env.slideshow.stop(ALICE, CONVERSATION).await.unwrap();

        let expected = vec![
            EventType::SlideshowStarted,
            EventType::SlideshowNavigate,
            EventType::SlideshowControlTransferred,
            EventType::SlideshowAutoAdvanceUpdated,
            EventType::SlideshowStopped,
        ];
        assert_eq!(types(&drain(&mut alice)), expected);
        assert_eq!(types(&drain(&mut bob)), expected);
        assert_eq!(env.slideshow_store.count(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_start_keeps_original() {
        let env = create_test_environment();

        env.slideshow
            .start(ALICE, CONVERSATION, StartSlideshowRequest::personal(vec![1, 2]))
            .await
            .unwrap();
        let second = env
            .slideshow
            .start(BOB, CONVERSATION, StartSlideshowRequest::reddit("pics"))
            .await;
        assert!(matches!(second, Err(SlideshowError::Conflict(_))));

        let session = env.slideshow_store.get(CONVERSATION).await.unwrap().unwrap();
        assert_eq!(session.controller_user_id, ALICE);
        assert_eq!(session.total_items, 2);
    }

    #[tokio::test]
    async fn test_controller_race_is_last_write_wins() {
        let env = create_test_environment();
        env.slideshow
            .start(ALICE, CONVERSATION, StartSlideshowRequest::personal((0..20).collect()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for index in 1..=10 {
            let slideshow = env.slideshow.clone();
            handles.push(tokio::spawn(async move {
                slideshow.navigate(ALICE, CONVERSATION, index).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let session = env.slideshow_store.get(CONVERSATION).await.unwrap().unwrap();
        assert!((1..=10).contains(&session.current_index));
    }
}

// =============================================================================
// Registry Concurrency Tests
// =============================================================================

mod registry_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_broadcast_unregister() {
        let manager = Arc::new(ConnectionManager::new());
        let mut handles = Vec::new();

        for task in 0..64i64 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let user_id = task % 16;
                for round in 0..50 {
                    let (tx, _rx) = mpsc::channel(4);
                    let handle = manager.register(user_id, tx);
                    manager.broadcast(Envelope::new(
                        (user_id + round) % 16,
                        Event::MessageDelivered(MessageDeliveredPayload {
                            message_id: round,
                            conversation_id: 1,
                        }),
                    ));
                    manager.unregister(user_id, handle.id);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let stats = manager.stats();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.online_users, 0);
    }

    #[tokio::test]
    async fn test_broadcast_to_offline_user_does_not_block() {
        let manager = ConnectionManager::new();
        let event = Event::MessageDelivered(MessageDeliveredPayload {
            message_id: 1,
            conversation_id: 1,
        });

        for user_id in 0..1000 {
            manager.broadcast(Envelope::new(user_id, event.clone()));
        }
        assert_eq!(manager.stats().total_connections, 0);
    }
}
