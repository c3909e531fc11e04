//! RoomRepository - Repository per stanze e membership

use super::{Create, Delete, Read};
use crate::dtos::CreateRoomDTO;
use crate::entities::{Room, RoomMember};
use chrono::Utc;
use sqlx::{Error, FromRow, SqlitePool};
use tracing::{debug, info, instrument};

const ROOM_COLUMNS: &str = "room_id, name, description, created_by, created_at";

/// Riga della query dei compagni di stanza: un membro di una stanza condivisa con l'utente
#[derive(Debug, Clone, FromRow)]
pub struct CoMemberRow {
    pub room_id: i32,
    pub room_name: String,
    pub user_id: i32,
}

// ROOM REPOSITORY
pub struct RoomRepository {
    connection_pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Stanze di cui l'utente è membro
    #[instrument(skip(self))]
    pub async fn find_many_by_user_id(&self, user_id: i32) -> Result<Vec<Room>, Error> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT r.room_id, r.name, r.description, r.created_by, r.created_at
            FROM rooms r
            INNER JOIN room_members rm ON rm.room_id = r.room_id
            WHERE rm.user_id = ?
            ORDER BY r.created_at DESC, r.room_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("User is member of {} rooms", rooms.len());
        Ok(rooms)
    }

    pub async fn find_members(&self, room_id: i32) -> Result<Vec<RoomMember>, Error> {
        sqlx::query_as::<_, RoomMember>(
            "SELECT room_id, user_id, joined_at FROM room_members WHERE room_id = ? ORDER BY joined_at ASC, user_id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn count_members(&self, room_id: i32) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM room_members WHERE room_id = ?")
            .bind(room_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    pub async fn is_member(&self, room_id: i32, user_id: i32) -> Result<bool, Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM room_members WHERE room_id = ? AND user_id = ?")
                .bind(room_id)
                .bind(user_id)
                .fetch_one(&self.connection_pool)
                .await?;

        Ok(count > 0)
    }

    /// Vero se i due utenti condividono almeno una stanza
    pub async fn share_room(&self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM room_members a
            INNER JOIN room_members b ON a.room_id = b.room_id
            WHERE a.user_id = ? AND b.user_id = ?
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    /// Tutti gli altri membri delle stanze di `user_id`, una riga per (stanza, membro)
    #[instrument(skip(self))]
    pub async fn find_co_members(&self, user_id: i32) -> Result<Vec<CoMemberRow>, Error> {
        let rows = sqlx::query_as::<_, CoMemberRow>(
            r#"
            SELECT r.room_id AS room_id, r.name AS room_name, other.user_id AS user_id
            FROM room_members mine
            INNER JOIN room_members other ON other.room_id = mine.room_id
            INNER JOIN rooms r ON r.room_id = mine.room_id
            WHERE mine.user_id = ? AND other.user_id <> ?
            ORDER BY r.room_id ASC, other.user_id ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("Found {} co-member rows", rows.len());
        Ok(rows)
    }

    /// Aggiunge membri ignorando quelli già presenti; ritorna il numero di nuovi membri
    #[instrument(skip(self, user_ids), fields(count = user_ids.len()))]
    pub async fn add_members(&self, room_id: i32, user_ids: &[i32]) -> Result<u64, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let now = Utc::now();
        let mut added = 0;

        for user_id in user_ids {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(room_id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            added += result.rows_affected();
        }

        tx.commit().await?;
        info!("Added {} members to room {}", added, room_id);
        Ok(added)
    }

    pub async fn remove_member(&self, room_id: i32, user_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM room_members WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Create<Room, CreateRoomDTO> for RoomRepository {
    /// Crea la stanza e inserisce creatore e membri iniziali in un'unica transazione
    #[instrument(skip(self, data), fields(created_by = %data.created_by))]
    async fn create(&self, data: &CreateRoomDTO) -> Result<Room, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let now = Utc::now();

        let room = sqlx::query_as::<_, Room>(&format!(
            "INSERT INTO rooms (name, description, created_by, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(data.name.trim())
        .bind(data.description.as_deref())
        .bind(data.created_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let members = std::iter::once(data.created_by)
            .chain(data.member_ids.iter().copied().filter(|id| *id != data.created_by));

        for user_id in members {
            sqlx::query(
                "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(room.room_id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Room created with id {}", room.room_id);
        Ok(room)
    }
}

impl Read<Room, i32> for RoomRepository {
    async fn read(&self, id: &i32) -> Result<Option<Room>, Error> {
        sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE room_id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl RoomRepository {
    /// Cancella, in un'unica transazione, le stanze di `room_ids` create da `owner_id`
    ///
    /// Ritorna gli id effettivamente cancellati; se una cancellazione fallisce non ne resta nessuna.
    #[instrument(skip(self, room_ids), fields(count = room_ids.len()))]
    pub async fn delete_owned(&self, room_ids: &[i32], owner_id: i32) -> Result<Vec<i32>, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let mut deleted = Vec::with_capacity(room_ids.len());

        for room_id in room_ids {
            let owned: Option<i32> = sqlx::query_scalar(
                "SELECT room_id FROM rooms WHERE room_id = ? AND created_by = ?",
            )
            .bind(room_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;

            if owned.is_none() {
                continue;
            }

            sqlx::query("DELETE FROM messages WHERE room_id = ?")
                .bind(room_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM room_members WHERE room_id = ?")
                .bind(room_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM rooms WHERE room_id = ?")
                .bind(room_id)
                .execute(&mut *tx)
                .await?;
            deleted.push(*room_id);
        }

        tx.commit().await?;
        info!("Deleted {} rooms owned by {}", deleted.len(), owner_id);
        Ok(deleted)
    }
}

impl Delete<i32> for RoomRepository {
    /// Cancella messaggi, membri e stanza
    #[instrument(skip(self), fields(room_id = %id))]
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM room_members WHERE room_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM rooms WHERE room_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        tx.commit().await?;
        info!("Room deleted");
        Ok(())
    }
}
