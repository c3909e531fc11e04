//! Room DTOs - Data Transfer Objects per stanze

use crate::dtos::UserDTO;
use crate::dtos::user::validate_not_blank;
use crate::entities::Room;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoomDTO {
    pub room_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserDTO>>, // da popolare manualmente se necessario
}

impl From<Room> for RoomDTO {
    fn from(value: Room) -> Self {
        Self {
            room_id: value.room_id,
            name: value.name,
            description: value.description,
            created_by: value.created_by,
            created_at: value.created_at,
            member_count: None,
            members: None,
        }
    }
}

/// Body di POST /rooms
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequestDTO {
    #[validate(
        length(min = 1, max = 100, message = "Room name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub member_ids: Vec<i32>,
}

/// DTO per creare una nuova stanza (senza room_id)
#[derive(Debug, Clone)]
pub struct CreateRoomDTO {
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32,
    pub member_ids: Vec<i32>,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersDTO {
    #[validate(length(min = 1, max = 500, message = "Provide between 1 and 500 user ids"))]
    pub user_ids: Vec<i32>,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRoomsDTO {
    #[validate(length(min = 1, max = 100, message = "Provide between 1 and 100 room ids"))]
    pub room_ids: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResultDTO {
    pub deleted: Vec<i32>,
    pub skipped: Vec<i32>,
}
