use std::sync::Arc;

use crate::connection_manager::Broadcaster;
use crate::metrics::SlideshowMetrics;
use crate::protocol::{
    AutoAdvancePayload, ControlTransferredPayload, ConversationId, Event, NavigatePayload,
    SlideshowStoppedPayload, UserId,
};
use crate::store::{ConversationDirectory, Participants};

use super::store::SlideshowStore;
use super::types::{
    is_valid_interval, SlideshowError, SlideshowResult, SlideshowSession, SlideshowType,
    StartSlideshowRequest, AUTO_ADVANCE_INTERVALS,
};

/// Drives slideshow sessions.
///
/// Every mutating transition authorizes, persists, then notifies both
/// participants. Nothing is broadcast unless the write succeeded.
pub struct SlideshowCoordinator {
    store: Arc<dyn SlideshowStore>,
    conversations: Arc<dyn ConversationDirectory>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl SlideshowCoordinator {
    pub fn new(
        store: Arc<dyn SlideshowStore>,
        conversations: Arc<dyn ConversationDirectory>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            store,
            conversations,
            broadcaster,
        }
    }

    /// Start a session with the caller as controller
    #[tracing::instrument(
        name = "slideshow.start",
        skip(self, request),
        fields(slideshow_type = ?request.slideshow_type)
    )]
    pub async fn start(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        request: StartSlideshowRequest,
    ) -> SlideshowResult<SlideshowSession> {
        let result = self.try_start(user_id, conversation_id, request).await;
        record("start", &result);
        result
    }

    /// Current session, visible to either participant
    #[tracing::instrument(name = "slideshow.get", skip(self))]
    pub async fn get(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> SlideshowResult<SlideshowSession> {
        self.authorize(user_id, conversation_id).await?;
        self.store
            .get(conversation_id)
            .await
            .map_err(SlideshowError::Internal)?
            .ok_or_else(|| no_session(conversation_id))
    }

    /// Move to `index`. Controller only.
    #[tracing::instrument(name = "slideshow.navigate", skip(self))]
    pub async fn navigate(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        index: i64,
    ) -> SlideshowResult<SlideshowSession> {
        let result = self.try_navigate(user_id, conversation_id, index).await;
        record("navigate", &result);
        result
    }

    /// Hand control to the other participant. Controller only.
    #[tracing::instrument(name = "slideshow.transfer_control", skip(self))]
    pub async fn transfer_control(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> SlideshowResult<SlideshowSession> {
        let result = self.try_transfer_control(user_id, conversation_id).await;
        record("transfer_control", &result);
        result
    }

    /// Toggle auto-advance or change its interval. Controller only.
    ///
    /// When disabling, an unlisted interval is ignored and the stored one kept.
    #[tracing::instrument(name = "slideshow.update_auto_advance", skip(self))]
    pub async fn update_auto_advance(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        auto_advance: bool,
        interval: Option<u32>,
    ) -> SlideshowResult<SlideshowSession> {
        let result = self
            .try_update_auto_advance(user_id, conversation_id, auto_advance, interval)
            .await;
        record("update_auto_advance", &result);
        result
    }

    /// End the session. Either participant may stop it.
    #[tracing::instrument(name = "slideshow.stop", skip(self))]
    pub async fn stop(&self, user_id: UserId, conversation_id: ConversationId) -> SlideshowResult<()> {
        let result = self.try_stop(user_id, conversation_id).await;
        record("stop", &result);
        result
    }

    async fn try_start(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        request: StartSlideshowRequest,
    ) -> SlideshowResult<SlideshowSession> {
        let participants = self.authorize(user_id, conversation_id).await?;
        let session = request.into_session(conversation_id, user_id)?;
        let session = self.store.create(session).await?;

        tracing::info!(
            conversation_id = conversation_id,
            controller = user_id,
            "Slideshow started"
        );

        self.notify(&participants, Event::SlideshowStarted(session.clone()));
        Ok(session)
    }

    async fn try_navigate(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        index: i64,
    ) -> SlideshowResult<SlideshowSession> {
        let (participants, session) = self.load_as_controller(user_id, conversation_id).await?;

        let index = u32::try_from(index).map_err(|_| {
            SlideshowError::BadRequest(format!("index must be >= 0, got {}", index))
        })?;
        if session.slideshow_type == SlideshowType::Personal && index >= session.total_items {
            return Err(SlideshowError::BadRequest(format!(
                "index {} out of range (total {})",
                index, session.total_items
            )));
        }

        let session = self.store.update_index(conversation_id, index).await?;

        self.notify(
            &participants,
            Event::SlideshowNavigate(NavigatePayload {
                conversation_id,
                current_index: session.current_index,
            }),
        );
        Ok(session)
    }

    async fn try_transfer_control(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> SlideshowResult<SlideshowSession> {
        let (participants, _) = self.load_as_controller(user_id, conversation_id).await?;
        let new_controller = participants.other(user_id).ok_or_else(|| {
            SlideshowError::Forbidden("not a participant in this conversation".to_string())
        })?;

        let session = self
            .store
            .update_controller(conversation_id, new_controller)
            .await?;

        tracing::info!(
            conversation_id = conversation_id,
            from = user_id,
            to = new_controller,
            "Slideshow control transferred"
        );

        self.notify(
            &participants,
            Event::SlideshowControlTransferred(ControlTransferredPayload {
                conversation_id,
                controller_user_id: session.controller_user_id,
            }),
        );
        Ok(session)
    }

    async fn try_update_auto_advance(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        auto_advance: bool,
        interval: Option<u32>,
    ) -> SlideshowResult<SlideshowSession> {
        let (participants, session) = self.load_as_controller(user_id, conversation_id).await?;

        let interval = match interval {
            Some(i) if is_valid_interval(i) => i,
            Some(i) if auto_advance => {
                return Err(SlideshowError::BadRequest(format!(
                    "auto_advance_interval {} is not one of {:?}",
                    i, AUTO_ADVANCE_INTERVALS
                )));
            }
            _ => session.auto_advance_interval,
        };

        let session = self
            .store
            .update_auto_advance(conversation_id, auto_advance, interval)
            .await?;

        self.notify(
            &participants,
            Event::SlideshowAutoAdvanceUpdated(AutoAdvancePayload {
                conversation_id,
                auto_advance: session.auto_advance,
                auto_advance_interval: session.auto_advance_interval,
            }),
        );
        Ok(session)
    }

    async fn try_stop(&self, user_id: UserId, conversation_id: ConversationId) -> SlideshowResult<()> {
        let participants = self.authorize(user_id, conversation_id).await?;

        let existed = self
            .store
            .delete(conversation_id)
            .await
            .map_err(SlideshowError::Internal)?;
        if !existed {
            return Err(no_session(conversation_id));
        }

        tracing::info!(
            conversation_id = conversation_id,
            stopped_by = user_id,
            "Slideshow stopped"
        );

        self.notify(
            &participants,
            Event::SlideshowStopped(SlideshowStoppedPayload {
                conversation_id,
                stopped_by: user_id,
            }),
        );
        Ok(())
    }

    /// Resolve participants and require `user_id` among them
    async fn authorize(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> SlideshowResult<Participants> {
        let participants = self
            .conversations
            .participants(conversation_id)
            .await
            .map_err(SlideshowError::Internal)?
            .ok_or_else(|| {
                SlideshowError::NotFound(format!("conversation {} not found", conversation_id))
            })?;

        if !participants.contains(user_id) {
            return Err(SlideshowError::Forbidden(
                "not a participant in this conversation".to_string(),
            ));
        }

        Ok(participants)
    }

    /// Participant check, session lookup and controller check
    async fn load_as_controller(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> SlideshowResult<(Participants, SlideshowSession)> {
        let participants = self.authorize(user_id, conversation_id).await?;
        let session = self
            .store
            .get(conversation_id)
            .await
            .map_err(SlideshowError::Internal)?
            .ok_or_else(|| no_session(conversation_id))?;

        if session.controller_user_id != user_id {
            return Err(SlideshowError::Forbidden(
                "only the current controller can do this".to_string(),
            ));
        }

        Ok((participants, session))
    }

    fn notify(&self, participants: &Participants, event: Event) {
        self.broadcaster
            .broadcast_to_users(&participants.as_vec(), event);
    }
}

fn no_session(conversation_id: ConversationId) -> SlideshowError {
    SlideshowError::NotFound(format!(
        "no active slideshow for conversation {}",
        conversation_id
    ))
}

fn record<T>(transition: &str, result: &SlideshowResult<T>) {
    SlideshowMetrics::record_transition(transition, result.is_ok());
    if let Err(SlideshowError::Internal(e)) = result {
        tracing::error!(transition = transition, error = %e, "Slideshow storage failure");
    }
}
