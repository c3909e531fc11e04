//! MessageRepository - Repository per la gestione dei messaggi

use super::Create;
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use sqlx::{Error, FromRow, SqlitePool};
use tracing::{debug, info, instrument};

const MESSAGE_COLUMNS: &str =
    "message_id, sender_id, room_id, recipient_id, content, attachment_id, created_at";

/// Aggregato per interlocutore delle conversazioni dirette di un utente
#[derive(Debug, Clone, FromRow)]
pub struct DirectPartnerRow {
    pub partner_id: i32,
    pub message_count: i64,
    pub last_message_at: DateTime<Utc>,
}

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Get paginated messages for a room
    ///
    /// - Loading recent messages (when `before` is None): gets the most recent `limit` messages
    /// - Loading older messages (when `before` is Some): gets `limit` messages before that date
    ///
    /// # Returns
    /// Messages ordered from newest to oldest (DESC), limited to `limit` count
    #[instrument(skip(self))]
    pub async fn find_room_messages(
        &self,
        room_id: i32,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE room_id = ? AND (? IS NULL OR created_at < ?)
             ORDER BY created_at DESC, message_id DESC
             LIMIT ?"
        ))
        .bind(room_id)
        .bind(before)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("Loaded {} room messages", messages.len());
        Ok(messages)
    }

    /// Messaggi diretti tra due utenti, dal più recente, con la stessa paginazione delle stanze
    #[instrument(skip(self))]
    pub async fn find_direct_messages(
        &self,
        user_a: i32,
        user_b: i32,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE ((sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?))
               AND (? IS NULL OR created_at < ?)
             ORDER BY created_at DESC, message_id DESC
             LIMIT ?"
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .bind(before)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("Loaded {} direct messages", messages.len());
        Ok(messages)
    }

    /// Interlocutori diretti di `user_id` con numero di messaggi e data dell'ultimo
    #[instrument(skip(self))]
    pub async fn find_direct_partners(&self, user_id: i32) -> Result<Vec<DirectPartnerRow>, Error> {
        let rows = sqlx::query_as::<_, DirectPartnerRow>(
            r#"
            SELECT
                CASE WHEN sender_id = ? THEN recipient_id ELSE sender_id END AS partner_id,
                COUNT(*) AS message_count,
                MAX(created_at) AS last_message_at
            FROM messages
            WHERE recipient_id IS NOT NULL AND (sender_id = ? OR recipient_id = ?)
            GROUP BY partner_id
            ORDER BY last_message_at DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("User has {} direct partners", rows.len());
        Ok(rows)
    }

    /// Messaggio che referenzia l'allegato (per il controllo degli accessi al download)
    pub async fn find_by_attachment_id(&self, attachment_id: i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE attachment_id = ? ORDER BY message_id ASC LIMIT 1"
        ))
        .bind(attachment_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(sender_id = %data.sender_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (sender_id, room_id, recipient_id, content, attachment_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(data.sender_id)
        .bind(data.target.room_id())
        .bind(data.target.recipient_id())
        .bind(&data.content)
        .bind(data.attachment_id)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Message created with id {}", message.message_id);
        Ok(message)
    }
}
