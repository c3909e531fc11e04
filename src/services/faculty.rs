//! Faculty messaging services - Messaggi e file dai docenti verso studenti e stanze

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    AttachmentDTO, CreateAttachmentDTO, CreateMessageDTO, FacultyMessageDTO, MessageDTO,
    MessageTarget,
};
use crate::entities::{User, UserRole};
use crate::repositories::{Create, Read};
use crate::storage::sanitize_file_name;
use axum::{
    Extension,
    extract::{Json, Multipart, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const MAX_CONTENT_CHARS: usize = 5000;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileMessageDTO {
    pub message: MessageDTO,
    pub attachment: AttachmentDTO,
}

/// Risolve e verifica la destinazione di un messaggio del docente
///
/// Il destinatario diretto deve essere uno studente, la stanza deve contenere il docente.
async fn resolve_target(
    state: &AppState,
    faculty: &User,
    recipient_id: Option<i32>,
    room_id: Option<i32>,
) -> Result<MessageTarget, AppError> {
    let target = MessageTarget::from_parts(recipient_id, room_id).ok_or_else(|| {
        AppError::bad_request("Provide exactly one of recipientId or roomId")
    })?;

    match target {
        MessageTarget::Direct(user_id) => {
            let recipient = state
                .user
                .read(&user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Recipient not found"))?;
            if !recipient.has_role(UserRole::Student) {
                return Err(AppError::bad_request("Recipient must be a student"));
            }
        }
        MessageTarget::Room(room_id) => {
            state
                .room
                .read(&room_id)
                .await?
                .ok_or_else(|| AppError::not_found("Room not found"))?;
            if !state.room.is_member(room_id, faculty.user_id).await? {
                warn!("Faculty {} is not a member of room {}", faculty.user_id, room_id);
                return Err(AppError::forbidden("You are not a member of this room"));
            }
        }
    }

    Ok(target)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FacultyMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    require_role(&current_user, &[UserRole::Faculty])?;
    body.validate()?;

    let target = resolve_target(&state, &current_user, body.recipient_id, body.room_id).await?;

    let message = state
        .msg
        .create(&CreateMessageDTO {
            sender_id: current_user.user_id,
            target,
            content: body.content,
            attachment_id: None,
        })
        .await?;

    info!("Faculty message sent to {:?}", target);
    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}

struct UploadedFile {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

fn parse_id(field: &str, value: &str) -> Result<Option<i32>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i32>()
        .map(Some)
        .map_err(|_| AppError::bad_request("Invalid id").with_details(format!("{} must be an integer", field)))
}

#[debug_handler]
#[instrument(skip(state, current_user, multipart), fields(user_id = %current_user.user_id))]
pub async fn send_file(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileMessageDTO>), AppError> {
    // 1. Solo docenti
    // 2. Leggere i campi del form: file, recipientId|roomId, content
    // 3. Verificare dimensione e destinazione
    // 4. Salvare il file, creare allegato e messaggio
    require_role(&current_user, &[UserRole::Faculty])?;

    let mut file: Option<UploadedFile> = None;
    let mut recipient_id = None;
    let mut room_id = None;
    let mut content = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or("file"));
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                let data = field.bytes().await?.to_vec();
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "recipientId" | "recipient_id" => recipient_id = parse_id(&name, &field.text().await?)?,
            "roomId" | "room_id" => room_id = parse_id(&name, &field.text().await?)?,
            "content" => content = field.text().await?,
            other => debug!("Ignoring multipart field {}", other),
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request("No file provided"))?;
    if file.data.is_empty() {
        return Err(AppError::bad_request("Uploaded file is empty"));
    }
    if file.data.len() > state.max_upload_bytes {
        warn!("Rejected upload of {} bytes", file.data.len());
        return Err(AppError::payload_too_large("File too large").with_details(format!(
            "Maximum size is {} bytes",
            state.max_upload_bytes
        )));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::bad_request("Message content must be at most 5000 characters"));
    }

    let target = resolve_target(&state, &current_user, recipient_id, room_id).await?;

    let storage_key = state.files.put(&file.file_name, &file.data).await?;
    let attachment = state
        .attachment
        .create(&CreateAttachmentDTO {
            uploader_id: current_user.user_id,
            file_name: file.file_name,
            content_type: file.content_type,
            size_bytes: file.data.len() as i64,
            storage_key: storage_key.clone(),
        })
        .await;

    // senza metadati il file non è raggiungibile: viene rimosso
    let attachment = match attachment {
        Ok(attachment) => attachment,
        Err(e) => {
            if let Err(io_err) = state.files.delete(&storage_key).await {
                warn!("Failed to remove orphan file {}: {}", storage_key, io_err);
            }
            return Err(e.into());
        }
    };

    let message = state
        .msg
        .create(&CreateMessageDTO {
            sender_id: current_user.user_id,
            target,
            content,
            attachment_id: Some(attachment.attachment_id),
        })
        .await?;

    info!("File {} sent as message {}", attachment.attachment_id, message.message_id);
    Ok((
        StatusCode::CREATED,
        Json(FileMessageDTO {
            message: MessageDTO::from(message),
            attachment: AttachmentDTO::from(attachment),
        }),
    ))
}
