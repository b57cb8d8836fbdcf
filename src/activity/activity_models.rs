use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Action code, e.g. TASK_CREATED, LOGIN, INACTIVITY_REMINDER.
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
