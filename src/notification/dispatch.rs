use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::notification_models::{NewNotification, Notification, NotificationKind};
use crate::email::{template, Mailer};
use crate::error::Result;
use crate::scheduler::store::NotificationStore;
use crate::user::User;

/// Everything that can turn into a notification, each variant carrying only
/// the fields its message needs.
#[derive(Debug, Clone)]
pub enum NotifyEvent {
    Deadline {
        task_id: Uuid,
        task_title: String,
        due_date: DateTime<Utc>,
    },
    Inactivity {
        pending_tasks: i64,
    },
    TaskCreated {
        task_id: Uuid,
        task_title: String,
    },
    TaskCompleted {
        task_id: Uuid,
        task_title: String,
    },
}

impl NotifyEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotifyEvent::Deadline { .. } => NotificationKind::Deadline,
            NotifyEvent::Inactivity { .. } => NotificationKind::System,
            NotifyEvent::TaskCreated { .. } | NotifyEvent::TaskCompleted { .. } => {
                NotificationKind::Task
            }
        }
    }

    pub fn related_task(&self) -> Option<Uuid> {
        match self {
            NotifyEvent::Deadline { task_id, .. }
            | NotifyEvent::TaskCreated { task_id, .. }
            | NotifyEvent::TaskCompleted { task_id, .. } => Some(*task_id),
            NotifyEvent::Inactivity { .. } => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            NotifyEvent::Deadline { .. } => "Upcoming Deadline",
            NotifyEvent::Inactivity { .. } => "Tasks Awaiting",
            NotifyEvent::TaskCreated { .. } => "Task Created",
            NotifyEvent::TaskCompleted { .. } => "Task Completed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            NotifyEvent::Deadline {
                task_title,
                due_date,
                ..
            } => format!(
                "Task \"{}\" is due soon ({}).",
                task_title,
                due_date.format("%Y-%m-%d %H:%M UTC")
            ),
            NotifyEvent::Inactivity { pending_tasks } => format!(
                "It looks like you've been away. You have {} pending {}. Log back in to stay on track.",
                pending_tasks,
                if *pending_tasks == 1 { "task" } else { "tasks" }
            ),
            NotifyEvent::TaskCreated { task_title, .. } => {
                format!("\"{}\" was added to your board.", task_title)
            }
            NotifyEvent::TaskCompleted { task_title, .. } => {
                format!("\"{}\" is done. Nice work.", task_title)
            }
        }
    }

    fn email_subject(&self) -> &'static str {
        match self {
            NotifyEvent::Deadline { .. } => "Reminder: Upcoming Task Deadline",
            _ => "Reminder: Continue Your Tasks",
        }
    }
}

/// Two-channel dispatch: persist the in-app record, then try email.
///
/// The record always lands first since the UI and the scanners' dedup check
/// read it. An email failure is logged and swallowed; it never reaches the
/// caller, so scan loops and state updates proceed regardless of the mailer.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
    deadline_email_enabled: bool,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
        deadline_email_enabled: bool,
    ) -> Self {
        Self {
            store,
            mailer,
            frontend_url,
            deadline_email_enabled,
        }
    }

    pub async fn notify(&self, user: &User, event: NotifyEvent) -> Result<Notification> {
        let record = self
            .store
            .create(NewNotification {
                user_id: user.id,
                task_id: event.related_task(),
                kind: event.kind(),
                title: event.title().to_string(),
                message: event.message(),
            })
            .await?;

        if self.wants_email(&event) && user.notification_enabled {
            let action_url = format!("{}/dashboard", self.frontend_url);
            let (text, html) =
                template::notification_email(event.title(), &event.message(), &action_url);

            if let Err(e) = self
                .mailer
                .send(&user.email, event.email_subject(), &text, &html)
                .await
            {
                warn!(user = %user.id, "notification email failed: {e}");
            }
        }

        Ok(record)
    }

    fn wants_email(&self, event: &NotifyEvent) -> bool {
        match event {
            NotifyEvent::Deadline { .. } => self.deadline_email_enabled,
            NotifyEvent::Inactivity { .. } => true,
            NotifyEvent::TaskCreated { .. } | NotifyEvent::TaskCompleted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{user, FailingMailer, MemBackend, RecordingMailer};

    fn notifier_with(
        backend: &Arc<MemBackend>,
        mailer: Arc<dyn Mailer>,
        deadline_email_enabled: bool,
    ) -> Notifier {
        Notifier::new(
            backend.clone(),
            mailer,
            "http://localhost:5173".to_string(),
            deadline_email_enabled,
        )
    }

    #[tokio::test]
    async fn persists_record_even_when_email_fails() {
        let backend = Arc::new(MemBackend::default());
        let notifier = notifier_with(&backend, Arc::new(FailingMailer), false);
        let recipient = user("ana@example.com");

        let result = notifier
            .notify(&recipient, NotifyEvent::Inactivity { pending_tasks: 3 })
            .await;

        let record = result.expect("email failure must not surface");
        assert_eq!(record.kind, NotificationKind::System);
        assert_eq!(backend.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deadline_email_is_gated_by_flag() {
        let backend = Arc::new(MemBackend::default());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier_with(&backend, mailer.clone(), false);
        let recipient = user("ben@example.com");

        let event = NotifyEvent::Deadline {
            task_id: Uuid::new_v4(),
            task_title: "Ship report".to_string(),
            due_date: Utc::now(),
        };
        notifier.notify(&recipient, event.clone()).await.unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());

        let notifier = notifier_with(&backend, mailer.clone(), true);
        notifier.notify(&recipient, event).await.unwrap();
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn opted_out_user_still_gets_in_app_record() {
        let backend = Arc::new(MemBackend::default());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier_with(&backend, mailer.clone(), true);
        let mut recipient = user("cara@example.com");
        recipient.notification_enabled = false;

        notifier
            .notify(&recipient, NotifyEvent::Inactivity { pending_tasks: 1 })
            .await
            .unwrap();

        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(backend.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn task_events_are_in_app_only() {
        let backend = Arc::new(MemBackend::default());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier_with(&backend, mailer.clone(), true);
        let recipient = user("dev@example.com");

        let record = notifier
            .notify(
                &recipient,
                NotifyEvent::TaskCreated {
                    task_id: Uuid::new_v4(),
                    task_title: "Write docs".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(record.kind, NotificationKind::Task);
        assert!(record.task_id.is_some());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn event_rendering_mentions_the_task() {
        let event = NotifyEvent::Deadline {
            task_id: Uuid::new_v4(),
            task_title: "Ship report".to_string(),
            due_date: Utc::now(),
        };
        assert_eq!(event.title(), "Upcoming Deadline");
        assert!(event.message().contains("Ship report"));
        assert_eq!(event.kind(), NotificationKind::Deadline);
    }
}
