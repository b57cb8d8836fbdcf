use super::activity_models::Activity;
use crate::error::Result;
use crate::scheduler::store::ActivityLog;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_recent(&self, user_id: Uuid) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM activities WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Record an activity off the caller's path. Logging must never block or
    /// fail the action being logged.
    pub fn log_detached(&self, user_id: Uuid, action: &'static str, details: String) {
        let repo = self.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.record(user_id, action, &details).await {
                tracing::debug!("activity logging skipped: {e}");
            }
        });
    }
}

#[async_trait]
impl ActivityLog for ActivityRepository {
    async fn record(&self, user_id: Uuid, action: &str, details: &str) -> Result<()> {
        sqlx::query("INSERT INTO activities (user_id, action, details) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(action)
            .bind(details)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
