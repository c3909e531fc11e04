//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Destinazione di un messaggio: una stanza oppure un utente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Room(i32),
    Direct(i32),
}

impl MessageTarget {
    pub fn room_id(&self) -> Option<i32> {
        match self {
            MessageTarget::Room(id) => Some(*id),
            MessageTarget::Direct(_) => None,
        }
    }

    pub fn recipient_id(&self) -> Option<i32> {
        match self {
            MessageTarget::Direct(id) => Some(*id),
            MessageTarget::Room(_) => None,
        }
    }

    /// Esattamente uno tra room e recipient
    pub fn from_parts(recipient_id: Option<i32>, room_id: Option<i32>) -> Option<Self> {
        match (recipient_id, room_id) {
            (Some(user), None) => Some(MessageTarget::Direct(user)),
            (None, Some(room)) => Some(MessageTarget::Room(room)),
            _ => None,
        }
    }
}

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageDTO {
    pub message_id: i32,
    pub sender_id: i32,
    pub room_id: Option<i32>,
    pub recipient_id: Option<i32>,
    pub content: String,
    pub attachment_id: Option<i32>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            message_id: value.message_id,
            sender_id: value.sender_id,
            room_id: value.room_id,
            recipient_id: value.recipient_id,
            content: value.content,
            attachment_url: value.attachment_id.map(|id| format!("/api/attachments/{}", id)),
            attachment_id: value.attachment_id,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un nuovo messaggio (senza message_id)
#[derive(Debug, Clone)]
pub struct CreateMessageDTO {
    pub sender_id: i32,
    pub target: MessageTarget,
    pub content: String,

    pub attachment_id: Option<i32>,
}

/// Body per l'invio di un messaggio in stanza o diretto
#[derive(Deserialize, Debug, Validate)]
pub struct SendMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}

/// Body di POST /faculty-messaging/send-message
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FacultyMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
    pub recipient_id: Option<i32>,
    pub room_id: Option<i32>,
}
