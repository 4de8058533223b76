use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::messaging::SendMessageRequest;
use crate::protocol::{ConversationId, MessageId, MessageRecord};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ConversationReadResponse {
    pub conversation_id: ConversationId,
    pub message_ids: Vec<MessageId>,
}

/// POST /api/v1/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRecord>)> {
    let message = state
        .messages
        .send_message(user_id, conversation_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/messages/{id}/read
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<MessageId>,
) -> Result<Json<MessageRecord>> {
    Ok(Json(state.messages.mark_read(user_id, message_id).await?))
}

/// POST /api/v1/conversations/{id}/read
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<ConversationReadResponse>> {
    let message_ids = state
        .messages
        .mark_conversation_read(user_id, conversation_id)
        .await?;

    Ok(Json(ConversationReadResponse {
        conversation_id,
        message_ids,
    }))
}
