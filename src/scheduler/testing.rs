//! In-memory stand-ins for the stores and the mailer, shared by the scanner
//! and dispatch tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::email::Mailer;
use crate::notification::dispatch::Notifier;
use crate::notification::{NewNotification, Notification, NotificationKind};
use crate::task::{Task, TaskPriority, TaskStatus};
use crate::user::User;

use super::deadline::DeadlineScanner;
use super::inactivity::InactivityScanner;
use super::store::{ActivityLog, NotificationStore, TaskStore, UserStore};

#[derive(Default)]
pub struct MemBackend {
    pub users: Mutex<Vec<User>>,
    pub tasks: Mutex<Vec<Task>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub activities: Mutex<Vec<(Uuid, String)>>,
}

impl MemBackend {
    pub fn add_user(&self, user: User) -> User {
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn add_task(&self, task: Task) -> Task {
        self.tasks.lock().unwrap().push(task.clone());
        task
    }

    pub fn user_by_id(&self, id: Uuid) -> User {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .expect("user seeded")
            .clone()
    }

    pub fn seed_notification(
        &self,
        user_id: Uuid,
        task_id: Option<Uuid>,
        kind: NotificationKind,
        created_at: DateTime<Utc>,
    ) {
        self.notifications.lock().unwrap().push(Notification {
            id: Uuid::new_v4(),
            user_id,
            task_id,
            kind,
            title: "seeded".to_string(),
            message: "seeded".to_string(),
            is_read: false,
            created_at,
        });
    }
}

#[async_trait]
impl TaskStore for MemBackend {
    async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.status != TaskStatus::Completed
                    && t.due_date.is_some_and(|due| due >= start && due <= end)
            })
            .cloned()
            .collect())
    }

    async fn count_incomplete(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.status != TaskStatus::Completed)
            .count() as i64)
    }
}

#[async_trait]
impl UserStore for MemBackend {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn find_idle_users(&self, threshold: DateTime<Utc>) -> Result<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| {
                u.last_seen < threshold
                    && u.inactivity_notified_at.map_or(true, |at| at < threshold)
            })
            .cloned()
            .collect())
    }

    async fn update_last_notified(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.inactivity_notified_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemBackend {
    async fn exists_since(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.notifications.lock().unwrap().iter().any(|n| {
            n.user_id == user_id
                && n.task_id == Some(task_id)
                && n.kind == kind
                && n.created_at >= since
        }))
    }

    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            task_id: new.task_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification)
    }
}

#[async_trait]
impl ActivityLog for MemBackend {
    async fn record(&self, user_id: Uuid, action: &str, _details: &str) -> Result<()> {
        self.activities
            .lock()
            .unwrap()
            .push((user_id, action.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _text: &str, _html: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// A mailer whose relay is permanently down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _text: &str, _html: &str) -> Result<()> {
        Err(AppError::Email("smtp send: connection refused".to_string()))
    }
}

pub fn user(email: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: None,
        notification_enabled: true,
        last_seen: now,
        inactivity_notified_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn task_due(user_id: Uuid, due_date: Option<DateTime<Utc>>, status: TaskStatus) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        user_id,
        title: "A task".to_string(),
        description: None,
        status,
        priority: TaskPriority::Medium,
        category: "general".to_string(),
        tags: Vec::new(),
        due_date,
        created_at: now - Duration::days(1),
        updated_at: now,
    }
}

fn notifier(backend: &Arc<MemBackend>, mailer: Arc<dyn Mailer>, deadline_email: bool) -> Notifier {
    Notifier::new(
        backend.clone(),
        mailer,
        "http://localhost:5173".to_string(),
        deadline_email,
    )
}

pub fn deadline_scanner(
    backend: &Arc<MemBackend>,
    mailer: Arc<dyn Mailer>,
    deadline_email: bool,
) -> DeadlineScanner {
    DeadlineScanner::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        notifier(backend, mailer, deadline_email),
        Duration::hours(24),
    )
}

pub fn inactivity_scanner(backend: &Arc<MemBackend>, mailer: Arc<dyn Mailer>) -> InactivityScanner {
    InactivityScanner::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        notifier(backend, mailer, false),
        Duration::hours(2),
    )
}
