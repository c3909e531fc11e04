//! Direct message services - Conversazioni uno-a-uno fuori dalle stanze

use crate::core::{AppError, AppState};
use crate::dtos::{
    CreateMessageDTO, DirectConversationDTO, MessageDTO, MessageTarget, MessagesQuery,
    SendMessageDTO, UserDTO,
};
use crate::entities::{User, UserRole};
use crate::repositories::{Create, Read, ReadMany};
use crate::services::room::PAGE_SIZE;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Due utenti possono scriversi se amici, compagni di stanza, genitore/figlio
/// oppure se almeno uno dei due è un docente
pub async fn can_message(state: &AppState, sender: &User, recipient: &User) -> Result<bool, AppError> {
    if sender.has_role(UserRole::Faculty) || recipient.has_role(UserRole::Faculty) {
        return Ok(true);
    }

    let (a, b) = (sender.user_id, recipient.user_id);
    let (friends, share_room, parent_of, child_of) = tokio::try_join!(
        state.friend.are_friends(a, b),
        state.room.share_room(a, b),
        state.parent_link.is_linked(a, b),
        state.parent_link.is_linked(b, a),
    )?;

    Ok(friends || share_room || parent_of || child_of)
}

async fn find_counterpart(state: &AppState, current_user: &User, user_id: i32) -> Result<User, AppError> {
    if user_id == current_user.user_id {
        return Err(AppError::bad_request("Cannot chat with yourself"));
    }
    state
        .user
        .read(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[instrument(skip(state, current_user, params), fields(user_id = %current_user.user_id, other = %user_id))]
pub async fn get_direct_messages(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Query(params): Query<MessagesQuery>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    let other = find_counterpart(&state, &current_user, user_id).await?;

    let messages = state
        .msg
        .find_direct_messages(current_user.user_id, other.user_id, params.before, PAGE_SIZE)
        .await?;

    debug!("Retrieved {} direct messages", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, recipient = %user_id))]
pub async fn send_direct_message(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    // 1. Validare il contenuto
    // 2. Verificare che il destinatario esista e non sia il mittente
    // 3. Verificare la relazione tra i due utenti
    body.validate()?;
    let recipient = find_counterpart(&state, &current_user, user_id).await?;

    if !can_message(&state, &current_user, &recipient).await? {
        warn!("Direct message rejected: users are not connected");
        return Err(AppError::forbidden(
            "You can only message friends, room members or linked family",
        ));
    }

    let message = state
        .msg
        .create(&CreateMessageDTO {
            sender_id: current_user.user_id,
            target: MessageTarget::Direct(recipient.user_id),
            content: body.content,
            attachment_id: None,
        })
        .await?;

    info!("Direct message sent");
    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_direct_conversations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<DirectConversationDTO>>, AppError> {
    let partners = state.msg.find_direct_partners(current_user.user_id).await?;
    let ids: Vec<i32> = partners.iter().map(|p| p.partner_id).collect();

    let mut users: HashMap<i32, User> = state
        .user
        .read_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.user_id, u))
        .collect();

    // l'ordine della query (ultimo messaggio più recente) viene mantenuto
    let conversations: Vec<DirectConversationDTO> = partners
        .into_iter()
        .filter_map(|p| {
            users.remove(&p.partner_id).map(|user| DirectConversationDTO {
                user: UserDTO::from(user),
                message_count: p.message_count,
                last_message_at: p.last_message_at,
            })
        })
        .collect();

    info!("Found {} direct conversations", conversations.len());
    Ok(Json(conversations))
}
