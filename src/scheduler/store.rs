//! The scanners' view of the persistent stores.
//!
//! Repositories implement these traits; tests swap in an in-memory backend,
//! so the temporal logic in this module tree never needs a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::notification::{NewNotification, Notification, NotificationKind};
use crate::task::Task;
use crate::user::User;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks with a due date inside `[start, end]` (both ends inclusive)
    /// that are not completed. Tasks without a due date are never returned.
    async fn find_due_between(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Task>>;

    /// Number of a user's tasks that are not completed.
    async fn count_incomplete(&self, user_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Users last seen before `threshold` whose cool-down mark is unset or
    /// has itself aged past `threshold`.
    async fn find_idle_users(&self, threshold: DateTime<Utc>) -> Result<Vec<User>>;

    /// Stamp the cool-down mark after a notify cycle.
    async fn update_last_notified(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Whether a notification of `kind` for `(user, task)` was created at or
    /// after `since`. This is the dedup query the deadline scanner issues
    /// before every insert.
    async fn exists_since(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    async fn create(&self, new: NewNotification) -> Result<Notification>;
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, user_id: Uuid, action: &str, details: &str) -> Result<()>;
}
