//! FriendRequestRepository - Repository per richieste di amicizia e amicizie

use super::{Create, Read};
use crate::dtos::CreateFriendRequestDTO;
use crate::entities::{FriendRequest, FriendRequestStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

const REQUEST_COLUMNS: &str = "request_id, sender_id, recipient_id, status, created_at";

pub struct FriendRequestRepository {
    connection_pool: SqlitePool,
}

impl FriendRequestRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Richiesta pending o accettata tra due utenti, in qualunque direzione
    #[instrument(skip(self))]
    pub async fn find_open_between(
        &self,
        user_a: i32,
        user_b: i32,
    ) -> Result<Option<FriendRequest>, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests
             WHERE ((sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?))
               AND status IN ('pending', 'accepted')
             ORDER BY request_id DESC
             LIMIT 1"
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(request)
    }

    pub async fn are_friends(&self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        Ok(matches!(
            self.find_open_between(user_a, user_b).await?,
            Some(FriendRequest {
                status: FriendRequestStatus::Accepted,
                ..
            })
        ))
    }

    /// Id degli amici (richieste accettate in entrambe le direzioni)
    #[instrument(skip(self))]
    pub async fn find_friend_ids(&self, user_id: i32) -> Result<Vec<i32>, Error> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT CASE WHEN sender_id = ? THEN recipient_id ELSE sender_id END
            FROM friend_requests
            WHERE status = 'accepted' AND (sender_id = ? OR recipient_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("User has {} friends", ids.len());
        Ok(ids)
    }

    pub async fn find_incoming_pending(&self, user_id: i32) -> Result<Vec<FriendRequest>, Error> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests
             WHERE recipient_id = ? AND status = 'pending'
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_outgoing_pending(&self, user_id: i32) -> Result<Vec<FriendRequest>, Error> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests
             WHERE sender_id = ? AND status = 'pending'
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Update request status (accept/reject)
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        request_id: i32,
        new_status: FriendRequestStatus,
    ) -> Result<FriendRequest, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "UPDATE friend_requests SET status = ? WHERE request_id = ? RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(new_status)
        .bind(request_id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)?;

        info!("Friend request {} is now {:?}", request_id, new_status);
        Ok(request)
    }
}

impl Create<FriendRequest, CreateFriendRequestDTO> for FriendRequestRepository {
    async fn create(&self, data: &CreateFriendRequestDTO) -> Result<FriendRequest, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "INSERT INTO friend_requests (sender_id, recipient_id, status, created_at)
             VALUES (?, ?, 'pending', ?)
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(data.sender_id)
        .bind(data.recipient_id)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Friend request created with id {}", request.request_id);
        Ok(request)
    }
}

impl Read<FriendRequest, i32> for FriendRequestRepository {
    async fn read(&self, id: &i32) -> Result<Option<FriendRequest>, Error> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE request_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
