//! # User Repository
//!
//! Registered customers. Emails are unique; the UNIQUE index on
//! `users.email` is the final arbiter when two registrations race.

use chrono::{DateTime, Utc};
use shop_core::Email;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A stored user, including the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Ok(UserRecord)` - The created user
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn create(&self, email: &Email, password_hash: &str, name: &str) -> DbResult<UserRecord> {
        debug!(email = %email, "Creating user");

        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, password_hash, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: email.to_string(),
            },
            other => other,
        })?;

        Ok(user)
    }

    /// Finds a user by email.
    pub async fn find_by_email(&self, email: &Email) -> DbResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
