//! User services - Gestione utenti, figli e vista di supervisione

use crate::conversations::{merge_conversations, partner_ids, summarize};
use crate::core::{AppError, AppState, require_role};
use crate::dtos::{ChildConversationsDTO, LinkChildDTO, UserDTO, UserSearchQuery};
use crate::entities::{User, UserRole};
use crate::repositories::{Read, ReadMany};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const SEARCH_LIMIT: i64 = 20;

/// Verifica che `parent` sia un genitore collegato allo studente `child_id`
///
/// # Returns
/// Lo studente, oppure 403 (ruolo o collegamento mancante) / 404 (studente inesistente)
pub async fn ensure_parent_of(
    state: &AppState,
    parent: &User,
    child_id: i32,
) -> Result<User, AppError> {
    require_role(parent, &[UserRole::Parent])?;

    let child = state.user.read(&child_id).await?.ok_or_else(|| {
        warn!("Child {} not found", child_id);
        AppError::not_found("Child not found")
    })?;

    if !state.parent_link.is_linked(parent.user_id, child_id).await? {
        warn!("Parent {} is not linked to user {}", parent.user_id, child_id);
        return Err(AppError::forbidden("You are not authorized to view this user's conversations"));
    }

    Ok(child)
}

#[instrument(skip(state, current_user), fields(q = %params.q))]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<UserSearchQuery>, // query params /users/search?q=...
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Searching users by prefix");
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let users = state
        .user
        .search_by_prefix(&params.q, current_user.user_id, SEARCH_LIMIT)
        .await?;
    info!("Found {} users matching search criteria", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>, // parametro dalla URL /users/{id}
) -> Result<Json<UserDTO>, AppError> {
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_children(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    require_role(&current_user, &[UserRole::Parent])?;
    let children = state.parent_link.find_children(current_user.user_id).await?;
    Ok(Json(children.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn link_child(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<LinkChildDTO>,
) -> Result<(StatusCode, Json<UserDTO>), AppError> {
    require_role(&current_user, &[UserRole::Parent])?;
    body.validate()?;

    let child = state
        .user
        .find_by_email(&body.child_email)
        .await?
        .ok_or_else(|| AppError::not_found("No account found for the child's email"))?;

    if !child.has_role(UserRole::Student) {
        return Err(AppError::bad_request("Only student accounts can be linked"));
    }

    state
        .parent_link
        .link(current_user.user_id, child.user_id)
        .await?;

    info!("Linked child {}", child.user_id);
    Ok((StatusCode::CREATED, Json(UserDTO::from(child))))
}

#[instrument(skip(state, current_user), fields(parent_id = %current_user.user_id, child_id = %child_id))]
pub async fn get_child_conversations(
    State(state): State<Arc<AppState>>,
    Path(child_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ChildConversationsDTO>, AppError> {
    debug!("Aggregating child conversations");
    // 1. Verificare ruolo genitore e collegamento con lo studente
    // 2. Caricare in parallelo amici, compagni di stanza e interlocutori diretti
    // 3. Caricare in una sola query tutti gli utenti coinvolti
    // 4. Unire le sorgenti in una lista deduplicata ed etichettata
    let child = ensure_parent_of(&state, &current_user, child_id).await?;

    let (friends, co_members, partners) = tokio::try_join!(
        state.friend.find_friend_ids(child_id),
        state.room.find_co_members(child_id),
        state.msg.find_direct_partners(child_id),
    )?;

    let ids = partner_ids(child_id, &friends, &co_members, &partners);
    let users = state.user.read_many(&ids).await?;

    let conversations = merge_conversations(child_id, &friends, &co_members, &partners, users);
    let summary = summarize(&conversations);

    info!(
        "Aggregated {} conversations ({} direct)",
        summary.total, summary.direct_chats
    );
    Ok(Json(ChildConversationsDTO {
        child: UserDTO::from(child),
        conversations,
        summary,
    }))
}
