//! Room entity - Stanza di chat creata da un docente

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub room_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32, // sempre un utente faculty
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RoomMember {
    pub room_id: i32,
    pub user_id: i32,
    pub joined_at: DateTime<Utc>,
}
