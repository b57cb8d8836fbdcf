use super::user_models::User;
use crate::error::Result;
use crate::scheduler::store::UserStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Called off the request path on every authenticated request.
    pub async fn touch_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_notification_preferences(&self, user_id: Uuid, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE users SET notification_enabled = $1, updated_at = NOW() WHERE id = $2")
            .bind(enabled)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        UserRepository::find_by_id(self, user_id).await
    }

    async fn find_idle_users(&self, threshold: DateTime<Utc>) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE last_seen < $1
               AND (inactivity_notified_at IS NULL OR inactivity_notified_at < $1)",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_last_notified(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET inactivity_notified_at = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
