//! AttachmentRepository - Metadati dei file caricati

use super::{Create, Read};
use crate::dtos::CreateAttachmentDTO;
use crate::entities::Attachment;
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{info, instrument};

const ATTACHMENT_COLUMNS: &str =
    "attachment_id, uploader_id, file_name, content_type, size_bytes, storage_key, created_at";

pub struct AttachmentRepository {
    connection_pool: SqlitePool,
}

impl AttachmentRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }
}

impl Create<Attachment, CreateAttachmentDTO> for AttachmentRepository {
    #[instrument(skip(self, data), fields(uploader_id = %data.uploader_id, size = %data.size_bytes))]
    async fn create(&self, data: &CreateAttachmentDTO) -> Result<Attachment, Error> {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            "INSERT INTO attachments (uploader_id, file_name, content_type, size_bytes, storage_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(data.uploader_id)
        .bind(&data.file_name)
        .bind(&data.content_type)
        .bind(data.size_bytes)
        .bind(&data.storage_key)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Attachment stored with id {}", attachment.attachment_id);
        Ok(attachment)
    }
}

impl Read<Attachment, i32> for AttachmentRepository {
    async fn read(&self, id: &i32) -> Result<Option<Attachment>, Error> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE attachment_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
