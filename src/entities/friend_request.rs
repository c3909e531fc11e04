//! FriendRequest entity - Richiesta di amicizia tra due utenti

use super::enums::FriendRequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct FriendRequest {
    pub request_id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}
