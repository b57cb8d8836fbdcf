use super::task_dto::{CreateTaskRequest, UpdateTaskRequest};
use super::task_models::{Task, TaskStatus};
use crate::error::Result;
use crate::scheduler::store::TaskStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

pub struct TaskFilters {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, user_id: Uuid, filters: TaskFilters) -> Result<Vec<Task>> {
        let mut query = "SELECT * FROM tasks WHERE user_id = $1".to_string();
        let mut params_count = 1;

        if filters.status.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND status = ${}", params_count));
        }

        if filters.priority.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND priority = ${}", params_count));
        }

        if filters.category.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND category = ${}", params_count));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut db_query = sqlx::query_as::<_, Task>(&query).bind(user_id);

        if let Some(status) = filters.status {
            db_query = db_query.bind(status);
        }

        if let Some(priority) = filters.priority {
            db_query = db_query.bind(priority);
        }

        if let Some(category) = filters.category {
            db_query = db_query.bind(category);
        }

        let tasks = db_query.fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    pub async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    pub async fn create(&self, user_id: Uuid, payload: &CreateTaskRequest) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (user_id, title, description, status, priority, category, tags, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&payload.title)
        .bind(payload.description.as_deref())
        .bind(payload.status.unwrap_or_default())
        .bind(payload.priority.unwrap_or_default())
        .bind(payload.category.as_deref().unwrap_or("general"))
        .bind(payload.tags.clone().unwrap_or_default())
        .bind(payload.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: &UpdateTaskRequest,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                status = COALESCE($3, status),
                priority = COALESCE($4, priority),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                due_date = COALESCE($7, due_date),
                updated_at = NOW()
             WHERE id = $8 AND user_id = $9
             RETURNING *",
        )
        .bind(payload.title.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.status)
        .bind(payload.priority)
        .bind(payload.category.as_deref())
        .bind(payload.tags.clone())
        .bind(payload.due_date)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = $1, updated_at = NOW()
             WHERE id = $2 AND user_id = $3
             RETURNING *",
        )
        .bind(status)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE due_date IS NOT NULL
               AND due_date >= $1
               AND due_date <= $2
               AND status <> $3",
        )
        .bind(start)
        .bind(end)
        .bind(TaskStatus::Completed)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn count_incomplete(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status <> $2",
        )
        .bind(user_id)
        .bind(TaskStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
