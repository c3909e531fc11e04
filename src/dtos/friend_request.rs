//! FriendRequest DTOs

use crate::dtos::UserDTO;
use crate::entities::{FriendRequest, FriendRequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct CreateFriendRequestDTO {
    pub sender_id: i32,
    pub recipient_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestDTO {
    pub request_id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    /// L'altro utente della richiesta rispetto a chi la legge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_user: Option<UserDTO>,
}

impl From<FriendRequest> for FriendRequestDTO {
    fn from(value: FriendRequest) -> Self {
        Self {
            request_id: value.request_id,
            sender_id: value.sender_id,
            recipient_id: value.recipient_id,
            status: value.status,
            created_at: value.created_at,
            other_user: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FriendRequestsDTO {
    pub incoming: Vec<FriendRequestDTO>,
    pub outgoing: Vec<FriendRequestDTO>,
}
