use super::notification_models::{NewNotification, Notification, NotificationKind};
use crate::error::Result;
use crate::scheduler::store::NotificationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn exists_since(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM notifications
                 WHERE user_id = $1 AND task_id = $2 AND kind = $3 AND created_at >= $4
             )",
        )
        .bind(user_id)
        .bind(task_id)
        .bind(kind)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, task_id, kind, title, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(new.task_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }
}
