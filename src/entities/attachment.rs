//! Attachment entity - File allegato a un messaggio

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Attachment {
    pub attachment_id: i32,
    pub uploader_id: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String, // chiave nel FileStore, mai esposta al client
    pub created_at: DateTime<Utc>,
}
