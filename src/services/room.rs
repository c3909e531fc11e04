//! Room services - Gestione stanze, membri e messaggi di stanza

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    AddMembersDTO, BulkDeleteResultDTO, BulkDeleteRoomsDTO, CreateMessageDTO, CreateRoomDTO,
    CreateRoomRequestDTO, MessageDTO, MessageTarget, MessagesQuery, RoomDTO, SendMessageDTO,
    UserDTO,
};
use crate::entities::{Room, User, UserRole};
use crate::repositories::{Create, Delete, ReadMany};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

pub const PAGE_SIZE: i64 = 50;

fn ensure_creator(room: &Room, user: &User) -> Result<(), AppError> {
    if room.created_by != user.user_id {
        warn!("User {} is not the creator of room {}", user.user_id, room.room_id);
        return Err(AppError::forbidden("Only the room creator can perform this action"));
    }
    Ok(())
}

/// Verifica che tutti gli id esistano; ritorna gli id mancanti come dettaglio di un 400
async fn ensure_users_exist(state: &AppState, ids: &[i32]) -> Result<(), AppError> {
    let unique: Vec<i32> = ids.iter().copied().collect::<HashSet<_>>().into_iter().collect();
    let found: HashSet<i32> = state
        .user
        .read_many(&unique)
        .await?
        .into_iter()
        .map(|u| u.user_id)
        .collect();

    let mut missing: Vec<i32> = unique.into_iter().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(AppError::bad_request("Some users do not exist")
            .with_details(format!("Unknown user ids: {:?}", missing)));
    }
    Ok(())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<RoomDTO>>, AppError> {
    debug!("Listing rooms for user");
    let rooms = state.room.find_many_by_user_id(current_user.user_id).await?;

    let counts = try_join_all(rooms.iter().map(|r| state.room.count_members(r.room_id))).await?;

    let rooms_dto: Vec<RoomDTO> = rooms
        .into_iter()
        .zip(counts)
        .map(|(room, count)| RoomDTO {
            member_count: Some(count),
            ..RoomDTO::from(room)
        })
        .collect();

    info!("Successfully retrieved {} rooms", rooms_dto.len());
    Ok(Json(rooms_dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateRoomRequestDTO>,
) -> Result<(StatusCode, Json<RoomDTO>), AppError> {
    debug!("Creating new room");
    // 1. Solo i docenti creano stanze
    // 2. Validare nome/descrizione e l'esistenza dei membri iniziali
    // 3. Creare la stanza; il creatore è sempre membro
    require_role(&current_user, &[UserRole::Faculty])?;
    body.validate()?;
    ensure_users_exist(&state, &body.member_ids).await?;

    let room = state
        .room
        .create(&CreateRoomDTO {
            name: body.name,
            description: body.description,
            created_by: current_user.user_id,
            member_ids: body.member_ids,
        })
        .await?;

    let member_count = state.room.count_members(room.room_id).await?;

    info!("Room '{}' created", room.name);
    Ok((
        StatusCode::CREATED,
        Json(RoomDTO {
            member_count: Some(member_count),
            ..RoomDTO::from(room)
        }),
    ))
}

#[instrument(skip(state, room), fields(room_id = %room.room_id))]
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Extension(room): Extension<Room>, // ottenuto dal room_membership_middleware
) -> Result<Json<RoomDTO>, AppError> {
    let members = state.room.find_members(room.room_id).await?;
    let ids: Vec<i32> = members.iter().map(|m| m.user_id).collect();
    let mut users = state.user.read_many(&ids).await?;
    users.sort_by(|a, b| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()));

    Ok(Json(RoomDTO {
        member_count: Some(users.len() as i64),
        members: Some(users.into_iter().map(UserDTO::from).collect()),
        ..RoomDTO::from(room)
    }))
}

#[instrument(skip(state, current_user, room, body), fields(room_id = %room.room_id))]
pub async fn add_members(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(room): Extension<Room>,
    Json(body): Json<AddMembersDTO>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_creator(&room, &current_user)?;
    body.validate()?;
    ensure_users_exist(&state, &body.user_ids).await?;

    let added = state.room.add_members(room.room_id, &body.user_ids).await?;
    let member_count = state.room.count_members(room.room_id).await?;

    Ok(Json(serde_json::json!({
        "added": added,
        "memberCount": member_count,
    })))
}

#[debug_handler]
#[instrument(skip(state, current_user, room), fields(room_id = %room.room_id, target = %user_id))]
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((_room_id, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
    Extension(room): Extension<Room>,
) -> Result<StatusCode, AppError> {
    ensure_creator(&room, &current_user)?;

    if user_id == room.created_by {
        return Err(AppError::bad_request("The room creator cannot be removed"));
    }

    if !state.room.remove_member(room.room_id, user_id).await? {
        return Err(AppError::not_found("User is not a member of this room"));
    }

    info!("Member removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, room), fields(room_id = %room.room_id, user_id = %current_user.user_id))]
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(room): Extension<Room>,
) -> Result<StatusCode, AppError> {
    if room.created_by == current_user.user_id {
        return Err(AppError::conflict(
            "The room creator cannot leave the room, delete it instead",
        ));
    }

    state.room.remove_member(room.room_id, current_user.user_id).await?;
    info!("User left room");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, room), fields(room_id = %room.room_id))]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(room): Extension<Room>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_creator(&room, &current_user)?;
    state.room.delete(&room.room_id).await?;

    info!("Room deleted by creator");
    Ok(Json(serde_json::json!({
        "success": true,
        "roomId": room.room_id,
    })))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn bulk_delete_rooms(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<BulkDeleteRoomsDTO>,
) -> Result<Json<BulkDeleteResultDTO>, AppError> {
    // 1. Solo docenti
    // 2. Cancellare in blocco le stanze create dal chiamante (tutte o nessuna)
    // 3. Gli id inesistenti o di altri docenti finiscono in skipped
    require_role(&current_user, &[UserRole::Faculty])?;
    body.validate()?;

    let mut seen = HashSet::new();
    let room_ids: Vec<i32> = body.room_ids.into_iter().filter(|id| seen.insert(*id)).collect();

    let deleted = state
        .room
        .delete_owned(&room_ids, current_user.user_id)
        .await?;
    let skipped = room_ids
        .into_iter()
        .filter(|id| !deleted.contains(id))
        .collect();
    let result = BulkDeleteResultDTO { deleted, skipped };

    info!(
        "Bulk delete: {} deleted, {} skipped",
        result.deleted.len(),
        result.skipped.len()
    );
    Ok(Json(result))
}

#[instrument(skip(state, room, params), fields(room_id = %room.room_id))]
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesQuery>,
    Extension(room): Extension<Room>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    // before presente: 50 messaggi precedenti a quella data, altrimenti gli ultimi 50
    let messages = state
        .msg
        .find_room_messages(room.room_id, params.before, PAGE_SIZE)
        .await?;

    info!("Retrieved {} messages for room", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, current_user, room, body), fields(room_id = %room.room_id, user_id = %current_user.user_id))]
pub async fn post_room_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(room): Extension<Room>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    body.validate()?;

    let message = state
        .msg
        .create(&CreateMessageDTO {
            sender_id: current_user.user_id,
            target: MessageTarget::Room(room.room_id),
            content: body.content,
            attachment_id: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}
