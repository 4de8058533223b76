//! Slideshow endpoints. Every transition is delegated to the coordinator,
//! which persists before it broadcasts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::protocol::ConversationId;
use crate::server::AppState;
use crate::slideshow::{AutoAdvanceRequest, NavigateRequest, SlideshowSession, StartSlideshowRequest};

/// POST /api/v1/conversations/{id}/slideshow
pub async fn start_slideshow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<StartSlideshowRequest>,
) -> Result<(StatusCode, Json<SlideshowSession>)> {
    let session = state
        .slideshow
        .start(user_id, conversation_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/conversations/{id}/slideshow
pub async fn get_slideshow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<SlideshowSession>> {
    Ok(Json(state.slideshow.get(user_id, conversation_id).await?))
}

/// POST /api/v1/conversations/{id}/slideshow/navigate
pub async fn navigate_slideshow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<SlideshowSession>> {
    let session = state
        .slideshow
        .navigate(user_id, conversation_id, request.index)
        .await?;
    Ok(Json(session))
}

/// POST /api/v1/conversations/{id}/slideshow/transfer-control
pub async fn transfer_control(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<SlideshowSession>> {
    let session = state
        .slideshow
        .transfer_control(user_id, conversation_id)
        .await?;
    Ok(Json(session))
}

/// PUT /api/v1/conversations/{id}/slideshow/auto-advance
pub async fn update_auto_advance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<AutoAdvanceRequest>,
) -> Result<Json<SlideshowSession>> {
    let session = state
        .slideshow
        .update_auto_advance(
            user_id,
            conversation_id,
            request.auto_advance,
            request.auto_advance_interval,
        )
        .await?;
    Ok(Json(session))
}

/// DELETE /api/v1/conversations/{id}/slideshow
pub async fn stop_slideshow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<StatusCode> {
    state.slideshow.stop(user_id, conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, Router};
    use tower::ServiceExt;

    use crate::auth::Claims;
    use crate::config::{JwtConfig, Settings};
    use crate::server::{create_app, Stores};
    use crate::store::{MemoryConversationDirectory, Participants};
    use std::sync::Arc;

    const SECRET: &str = "slideshow-test-secret";

    fn test_app() -> Router {
        let settings = Settings {
            server: Default::default(),
            jwt: JwtConfig {
                secret: SECRET.to_string(),
                issuer: None,
                audience: None,
            },
            websocket: Default::default(),
            otel: Default::default(),
        };

        let conversations = Arc::new(MemoryConversationDirectory::new());
        conversations.insert(1, Participants::new(10, 20));
        let stores = Stores {
            conversations,
            ..Stores::in_memory()
        };

        create_app(AppState::with_stores(settings, stores))
    }

    fn token(user_id: i64) -> String {
        let claims = Claims::new(user_id, 3600);
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(method: &str, uri: &str, user_id: i64, body: Option<&str>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token(user_id)))
            .header("Content-Type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_conflict() {
        let app = test_app();
        let body = r#"{"slideshow_type":"personal","media_item_ids":[1,2,3]}"#;

        let response = app
            .clone()
            .oneshot(request("POST", "/api/v1/conversations/1/slideshow", 10, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request("POST", "/api/v1/conversations/1/slideshow", 20, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_non_controller_navigate_is_forbidden() {
        let app = test_app();
        let body = r#"{"slideshow_type":"personal","media_item_ids":[1,2,3]}"#;
        app.clone()
            .oneshot(request("POST", "/api/v1/conversations/1/slideshow", 10, Some(body)))
            .await
            .unwrap();

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/conversations/1/slideshow/navigate",
                20,
                Some(r#"{"index":1}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_outsider_and_missing_token() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/conversations/1/slideshow", 99, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/conversations/1/slideshow")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stop_returns_no_content() {
        let app = test_app();
        let body = r#"{"slideshow_type":"reddit","subreddit":"r/earthporn","total_items":25}"#;
        app.clone()
            .oneshot(request("POST", "/api/v1/conversations/1/slideshow", 10, Some(body)))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/v1/conversations/1/slideshow", 20, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/api/v1/conversations/1/slideshow", 10, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
