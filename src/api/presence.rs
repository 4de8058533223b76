use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::AuthUser;
use crate::connection_manager::UserPresence;
use crate::protocol::UserId;
use crate::server::AppState;

/// GET /api/v1/users/{id}/online
pub async fn user_presence(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<UserId>,
) -> Json<UserPresence> {
    let connection_count = state.connection_manager.user_connection_count(user_id);

    Json(UserPresence {
        user_id,
        online: connection_count > 0,
        connection_count,
    })
}
