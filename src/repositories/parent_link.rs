//! ParentLinkRepository - Collegamenti genitore/studente

use crate::entities::{ParentLink, User};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{info, instrument};

pub struct ParentLinkRepository {
    connection_pool: SqlitePool,
}

impl ParentLinkRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Idempotente: un collegamento già esistente viene lasciato invariato
    #[instrument(skip(self))]
    pub async fn link(&self, parent_id: i32, child_id: i32) -> Result<ParentLink, Error> {
        sqlx::query(
            "INSERT OR IGNORE INTO parent_links (parent_id, child_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(Utc::now())
        .execute(&self.connection_pool)
        .await?;

        let link = sqlx::query_as::<_, ParentLink>(
            "SELECT parent_id, child_id, created_at FROM parent_links WHERE parent_id = ? AND child_id = ?",
        )
        .bind(parent_id)
        .bind(child_id)
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Parent {} linked to child {}", parent_id, child_id);
        Ok(link)
    }

    pub async fn is_linked(&self, parent_id: i32, child_id: i32) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parent_links WHERE parent_id = ? AND child_id = ?",
        )
        .bind(parent_id)
        .bind(child_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn find_children(&self, parent_id: i32) -> Result<Vec<User>, Error> {
        let children = sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.full_name, u.email, u.password, u.role, u.bio,
                   u.profile_pic, u.is_onboarded, u.created_at
            FROM parent_links pl
            INNER JOIN users u ON u.user_id = pl.child_id
            WHERE pl.parent_id = ?
            ORDER BY u.full_name ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(children)
    }
}
