//! Attachment DTOs

use crate::entities::Attachment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDTO {
    pub attachment_id: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentDTO {
    fn from(value: Attachment) -> Self {
        Self {
            url: format!("/api/attachments/{}", value.attachment_id),
            attachment_id: value.attachment_id,
            file_name: value.file_name,
            content_type: value.content_type,
            size_bytes: value.size_bytes,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateAttachmentDTO {
    pub uploader_id: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
}
