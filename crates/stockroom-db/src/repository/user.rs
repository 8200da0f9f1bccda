//! # User Repository
//!
//! Single admin account. Holds the argon2 password hash and the id of the
//! one live session; logging in replaces it, logging out clears it.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use super::{now, ts};
use crate::error::{DbError, DbResult};

/// The admin row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AdminUser {
    pub username: String,
    /// `None` until the first password is set.
    pub password_hash: Option<String>,
    pub session_id: Option<String>,
    pub session_expires_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    /// `true` if `sid` is the current session and has not expired at `at`.
    pub fn session_is_live(&self, sid: &str, at: DateTime<Utc>) -> bool {
        match (&self.session_id, self.session_expires_at) {
            (Some(current), Some(expires)) => current == sid && at < expires,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn admin(&self) -> DbResult<AdminUser> {
        sqlx::query_as::<_, AdminUser>(
            "SELECT username, password_hash, session_id, session_expires_at FROM users WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("User", "admin"))
    }

    /// Stores a new hash and ends any live session.
    pub async fn set_password_hash(&self, hash: &str) -> DbResult<()> {
        info!("Updating admin password");

        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?1, session_id = NULL, session_expires_at = NULL, updated_at = ?2
            WHERE id = 1
            "#,
        )
        .bind(hash)
        .bind(ts(now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_session(&self, session_id: &str, expires_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            "UPDATE users SET session_id = ?1, session_expires_at = ?2, updated_at = ?3 WHERE id = 1",
        )
        .bind(session_id)
        .bind(ts(expires_at))
        .bind(ts(now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn clear_session(&self) -> DbResult<()> {
        sqlx::query(
            "UPDATE users SET session_id = NULL, session_expires_at = NULL, updated_at = ?1 WHERE id = 1",
        )
        .bind(ts(now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let admin = users.admin().await.unwrap();
        assert_eq!(admin.username, "admin");
        assert!(admin.password_hash.is_none());

        let expires = now() + Duration::hours(1);
        users.set_session("sid-1", expires).await.unwrap();

        let admin = users.admin().await.unwrap();
        assert!(admin.session_is_live("sid-1", now()));
        assert!(!admin.session_is_live("sid-2", now()));
        assert!(!admin.session_is_live("sid-1", expires));

        users.set_password_hash("$argon2id$stub").await.unwrap();
        let admin = users.admin().await.unwrap();
        assert!(!admin.session_is_live("sid-1", now()));
        assert_eq!(admin.password_hash.as_deref(), Some("$argon2id$stub"));
    }
}
