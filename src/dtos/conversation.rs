//! Conversation DTOs - Vista aggregata delle conversazioni di uno studente

use crate::dtos::UserDTO;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Etichetta della conversazione, dalla più alla meno diretta
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    Direct,
    Room,
    Friend,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedRoomDTO {
    pub room_id: i32,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntryDTO {
    pub user: UserDTO,
    pub is_friend: bool,
    pub is_room_member: bool,
    pub has_direct_chat: bool,
    pub conversation_type: ConversationType,
    pub shared_rooms: Vec<SharedRoomDTO>,
    pub message_count: i64,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryDTO {
    pub total: usize,
    pub friends: usize,
    pub room_members: usize,
    pub direct_chats: usize,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChildConversationsDTO {
    pub child: UserDTO,
    pub conversations: Vec<ConversationEntryDTO>,
    pub summary: ConversationSummaryDTO,
}

/// Riga di GET /messages/conversations
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DirectConversationDTO {
    pub user: UserDTO,
    pub message_count: i64,
    pub last_message_at: DateTime<Utc>,
}
