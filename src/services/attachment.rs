//! Attachment services - Download degli allegati con controllo degli accessi

use crate::core::{AppError, AppState};
use crate::entities::{Attachment, User};
use crate::repositories::Read;
use crate::storage::sanitize_file_name;
use axum::{
    Extension,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Può scaricare: chi ha caricato il file, il destinatario diretto, un membro della stanza
async fn can_download(state: &AppState, user: &User, attachment: &Attachment) -> Result<bool, AppError> {
    if attachment.uploader_id == user.user_id {
        return Ok(true);
    }

    let Some(message) = state.msg.find_by_attachment_id(attachment.attachment_id).await? else {
        return Ok(false);
    };

    if message.counterpart_of(user.user_id).is_some() {
        return Ok(true);
    }
    match message.room_id {
        Some(room_id) => Ok(state.room.is_member(room_id, user.user_id).await?),
        None => Ok(false),
    }
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    Path(attachment_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Response, AppError> {
    let attachment = state
        .attachment
        .read(&attachment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment not found"))?;

    if !can_download(&state, &current_user, &attachment).await? {
        warn!("Download of attachment {} denied", attachment_id);
        return Err(AppError::forbidden("You cannot access this attachment"));
    }

    let data = state.files.get(&attachment.storage_key).await?;

    let content_type = HeaderValue::from_str(&attachment.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&attachment.file_name)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    info!("Serving attachment {} ({} bytes)", attachment_id, data.len());
    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)],
        data,
    )
        .into_response())
}
