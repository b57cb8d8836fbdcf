use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A task's due date is inside the look-ahead window.
    Deadline,
    /// Generated by the platform itself, e.g. inactivity reminders.
    System,
    /// Side effect of a task mutation (created, completed).
    Task,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the notification store.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}
