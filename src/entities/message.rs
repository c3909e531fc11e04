//! Message entity - Entità messaggio (di stanza oppure diretto)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub message_id: i32,
    pub sender_id: i32,
    // esattamente uno tra room_id e recipient_id è valorizzato (vincolo CHECK sul db)
    pub room_id: Option<i32>,
    pub recipient_id: Option<i32>,
    pub content: String,
    pub attachment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Interlocutore di `user_id` in un messaggio diretto
    pub fn counterpart_of(&self, user_id: i32) -> Option<i32> {
        let recipient = self.recipient_id?;
        if self.sender_id == user_id {
            Some(recipient)
        } else if recipient == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}
