//! Friend services - Richieste di amicizia e lista amici

use crate::core::{AppError, AppState};
use crate::dtos::{CreateFriendRequestDTO, FriendRequestDTO, FriendRequestsDTO, UserDTO};
use crate::entities::{FriendRequest, FriendRequestStatus, User};
use crate::repositories::{Create, Read, ReadMany};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let ids = state.friend.find_friend_ids(current_user.user_id).await?;
    let mut friends = state.user.read_many(&ids).await?;
    friends.sort_by(|a, b| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()));
    debug!("Returning {} friends", friends.len());
    Ok(Json(friends.into_iter().map(UserDTO::from).collect()))
}

/// Arricchisce le richieste con l'altro utente rispetto a `viewer_id`
async fn enrich(
    state: &AppState,
    viewer_id: i32,
    requests: Vec<FriendRequest>,
) -> Result<Vec<FriendRequestDTO>, AppError> {
    let other_ids: Vec<i32> = requests
        .iter()
        .map(|r| {
            if r.sender_id == viewer_id {
                r.recipient_id
            } else {
                r.sender_id
            }
        })
        .collect();

    let others = try_join_all(other_ids.iter().map(|id| state.user.read(id))).await?;

    Ok(requests
        .into_iter()
        .zip(others)
        .map(|(request, other)| FriendRequestDTO {
            other_user: other.map(UserDTO::from),
            ..FriendRequestDTO::from(request)
        })
        .collect())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friend_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<FriendRequestsDTO>, AppError> {
    let (incoming, outgoing) = tokio::try_join!(
        state.friend.find_incoming_pending(current_user.user_id),
        state.friend.find_outgoing_pending(current_user.user_id),
    )?;

    info!(
        "Found {} incoming and {} outgoing requests",
        incoming.len(),
        outgoing.len()
    );
    Ok(Json(FriendRequestsDTO {
        incoming: enrich(&state, current_user.user_id, incoming).await?,
        outgoing: enrich(&state, current_user.user_id, outgoing).await?,
    }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, recipient_id = %recipient_id))]
pub async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    Path(recipient_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(StatusCode, Json<FriendRequestDTO>), AppError> {
    // 1. Non si può inviare una richiesta a se stessi
    // 2. Il destinatario deve esistere
    // 3. Nessuna richiesta pending o amicizia già presente, in nessuna direzione
    if recipient_id == current_user.user_id {
        return Err(AppError::bad_request("You can't send a friend request to yourself"));
    }

    if state.user.read(&recipient_id).await?.is_none() {
        warn!("Recipient not found");
        return Err(AppError::not_found("Recipient not found"));
    }

    if let Some(existing) = state
        .friend
        .find_open_between(current_user.user_id, recipient_id)
        .await?
    {
        warn!("Open request already exists: {:?}", existing.status);
        return Err(match existing.status {
            FriendRequestStatus::Accepted => {
                AppError::conflict("You are already friends with this user")
            }
            _ => AppError::conflict("A friend request already exists between you and this user"),
        });
    }

    let request = state
        .friend
        .create(&CreateFriendRequestDTO {
            sender_id: current_user.user_id,
            recipient_id,
        })
        .await?;

    info!("Friend request {} sent", request.request_id);
    Ok((StatusCode::CREATED, Json(FriendRequestDTO::from(request))))
}

async fn respond(
    state: &AppState,
    current_user: &User,
    request_id: i32,
    new_status: FriendRequestStatus,
) -> Result<FriendRequestDTO, AppError> {
    let request = state.friend.read(&request_id).await?.ok_or_else(|| {
        warn!("Friend request {} not found", request_id);
        AppError::not_found("Friend request not found")
    })?;

    if request.recipient_id != current_user.user_id {
        warn!("User is not the recipient of request {}", request_id);
        return Err(AppError::forbidden("You are not authorized to respond to this request"));
    }

    if request.status != FriendRequestStatus::Pending {
        return Err(AppError::conflict("Friend request is already processed")
            .with_details(format!("Request is {:?}", request.status)));
    }

    let updated = state.friend.update_status(request_id, new_status).await?;
    Ok(FriendRequestDTO::from(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, request_id = %request_id))]
pub async fn accept_friend_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<FriendRequestDTO>, AppError> {
    let dto = respond(&state, &current_user, request_id, FriendRequestStatus::Accepted).await?;
    info!("Friend request accepted");
    Ok(Json(dto))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, request_id = %request_id))]
pub async fn reject_friend_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<FriendRequestDTO>, AppError> {
    let dto = respond(&state, &current_user, request_id, FriendRequestStatus::Rejected).await?;
    info!("Friend request rejected");
    Ok(Json(dto))
}
