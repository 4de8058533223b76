//! Connection statistics

use serde::Serialize;

use crate::protocol::UserId;

/// Registry-wide connection statistics
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub online_users: usize,
}

/// Presence of a single user
#[derive(Debug, Clone, Serialize)]
pub struct UserPresence {
    pub user_id: UserId,
    pub online: bool,
    pub connection_count: usize,
}
