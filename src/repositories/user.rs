//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Read, ReadMany, Update};
use crate::dtos::{CreateUserDTO, UpdateProfileDTO};
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const USER_COLUMNS: &str =
    "user_id, full_name, email, password, role, bio, profile_pic, is_onboarded, created_at";

/// Rende letterali i caratteri speciali di LIKE (`\` è il carattere di escape)
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// USER REPO
pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// Email univoca e salvata in minuscolo
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Search users by name or email prefix (for search functionality)
    #[instrument(skip(self))]
    pub async fn search_by_prefix(
        &self,
        prefix: &str,
        exclude_id: i32,
        limit: i64,
    ) -> Result<Vec<User>, Error> {
        let pattern = format!("{}%", escape_like(&prefix.trim().to_lowercase()));
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE (lower(full_name) LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')
               AND user_id <> ?
             ORDER BY full_name ASC
             LIMIT ?"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(exclude_id)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("Found {} users for prefix", users.len());
        Ok(users)
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    #[instrument(skip(self, data), fields(email = %data.email, role = %data.role))]
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (full_name, email, password, role, is_onboarded, created_at)
             VALUES (?, ?, ?, ?, 0, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.full_name.trim())
        .bind(data.email.trim().to_lowercase())
        .bind(&data.password)
        .bind(data.role)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;

        info!("User created with id {}", user.user_id);
        Ok(user)
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE user_id IN ("));
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }
}

impl Update<User, UpdateProfileDTO, i32> for UserRepository {
    #[instrument(skip(self, data), fields(user_id = %id))]
    async fn update(&self, id: &i32, data: &UpdateProfileDTO) -> Result<User, Error> {
        // COALESCE mantiene i campi opzionali non forniti
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                full_name = ?,
                bio = COALESCE(?, bio),
                profile_pic = COALESCE(?, profile_pic),
                is_onboarded = 1
             WHERE user_id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.full_name.trim())
        .bind(data.bio.as_deref())
        .bind(data.profile_pic.as_deref())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)?;

        info!("User profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like_makes_wildcards_literal() {
        assert_eq!(escape_like("ada"), "ada");
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
