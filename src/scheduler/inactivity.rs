//! Inactivity scanner: reminds users who have been away for a while and
//! still have open tasks. The idle threshold doubles as the re-notify
//! cool-down, so a user becomes eligible again only once the previous
//! reminder has itself aged past the threshold.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::notification::dispatch::{Notifier, NotifyEvent};
use crate::user::User;

use super::deadline::ScanOutcome;
use super::store::{ActivityLog, TaskStore, UserStore};

pub struct InactivityScanner {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    activities: Arc<dyn ActivityLog>,
    notifier: Notifier,
    idle_after: Duration,
}

impl InactivityScanner {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        activities: Arc<dyn ActivityLog>,
        notifier: Notifier,
        idle_after: Duration,
    ) -> Self {
        Self {
            users,
            tasks,
            activities,
            notifier,
            idle_after,
        }
    }

    pub async fn scan(&self, now: DateTime<Utc>) -> Result<ScanOutcome> {
        let threshold = now - self.idle_after;
        let idle_users = self.users.find_idle_users(threshold).await?;

        let mut outcome = ScanOutcome {
            candidates: idle_users.len(),
            ..Default::default()
        };

        for user in &idle_users {
            match self.process_user(user, now).await {
                Ok(true) => outcome.notified += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    outcome.skipped += 1;
                    warn!(user = %user.id, "inactivity candidate failed, continuing: {e}");
                }
            }
        }

        Ok(outcome)
    }

    /// Returns Ok(true) when the user was notified and stamped.
    async fn process_user(&self, user: &User, now: DateTime<Utc>) -> Result<bool> {
        let pending = self.tasks.count_incomplete(user.id).await?;
        if pending == 0 {
            // Nothing to come back for; no notification, no state change.
            debug!(user = %user.id, "idle but no pending tasks");
            return Ok(false);
        }

        // The façade swallows email failures, so the cool-down stamp below is
        // written whenever the in-app record made it in. A dead mailer then
        // costs one in-app reminder per cool-down, not one per tick.
        self.notifier
            .notify(
                user,
                NotifyEvent::Inactivity {
                    pending_tasks: pending,
                },
            )
            .await?;

        self.users.update_last_notified(user.id, now).await?;

        if let Err(e) = self
            .activities
            .record(
                user.id,
                "INACTIVITY_REMINDER",
                "Dispatched inactivity reminder",
            )
            .await
        {
            debug!(user = %user.id, "activity record skipped: {e}");
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use crate::scheduler::testing::{
        inactivity_scanner, task_due, user, FailingMailer, MemBackend, RecordingMailer,
    };
    use crate::task::TaskStatus;

    fn idle_user(backend: &Arc<MemBackend>, email: &str, last_seen_ago: Duration) -> User {
        let mut u = user(email);
        u.last_seen = Utc::now() - last_seen_ago;
        backend.add_user(u)
    }

    #[tokio::test]
    async fn idle_user_with_pending_tasks_is_notified_once() {
        let backend = Arc::new(MemBackend::default());
        let mailer = Arc::new(RecordingMailer::default());
        let candidate = idle_user(&backend, "idle@example.com", Duration::hours(3));
        backend.add_task(task_due(candidate.id, None, TaskStatus::Pending));

        let scanner = inactivity_scanner(&backend, mailer.clone());
        let now = Utc::now();

        let outcome = scanner.scan(now).await.unwrap();
        assert_eq!(outcome.notified, 1);

        let notifications = backend.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::System);
        assert!(notifications[0].message.contains("1 pending task"));
        drop(notifications);

        // Stamped, emailed, and the reminder was recorded.
        let stamped = backend.user_by_id(candidate.id).inactivity_notified_at;
        assert_eq!(stamped, Some(now));
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
        assert!(backend
            .activities
            .lock()
            .unwrap()
            .iter()
            .any(|(id, action)| *id == candidate.id && action == "INACTIVITY_REMINDER"));

        // One minute later the cool-down is active: no new notification.
        let outcome = scanner.scan(now + Duration::minutes(1)).await.unwrap();
        assert_eq!(outcome.candidates, 0);
        assert_eq!(backend.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_pending_tasks_skips_without_state_change() {
        let backend = Arc::new(MemBackend::default());
        let mailer = Arc::new(RecordingMailer::default());
        let candidate = idle_user(&backend, "empty@example.com", Duration::hours(5));

        let scanner = inactivity_scanner(&backend, mailer.clone());
        let outcome = scanner.scan(Utc::now()).await.unwrap();

        assert_eq!(outcome.candidates, 1);
        assert_eq!(outcome.notified, 0);
        assert!(backend.notifications.lock().unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(backend.user_by_id(candidate.id).inactivity_notified_at, None);
    }

    #[tokio::test]
    async fn completed_tasks_do_not_count_as_pending() {
        let backend = Arc::new(MemBackend::default());
        let candidate = idle_user(&backend, "alldone@example.com", Duration::hours(3));
        backend.add_task(task_due(candidate.id, None, TaskStatus::Completed));

        let scanner = inactivity_scanner(&backend, Arc::new(RecordingMailer::default()));
        let outcome = scanner.scan(Utc::now()).await.unwrap();

        assert_eq!(outcome.notified, 0);
        assert!(backend.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cool_down_gates_renotification() {
        // lastSeen 150min ago with 3 pending tasks. Notified 200min ago:
        // cool-down elapsed, notify. Notified 30min ago: cool-down active.
        let backend = Arc::new(MemBackend::default());
        let now = Utc::now();

        let mut elapsed = user("elapsed@example.com");
        elapsed.last_seen = now - Duration::minutes(150);
        elapsed.inactivity_notified_at = Some(now - Duration::minutes(200));
        let elapsed = backend.add_user(elapsed);

        let mut recent = user("recent@example.com");
        recent.last_seen = now - Duration::minutes(150);
        recent.inactivity_notified_at = Some(now - Duration::minutes(30));
        let recent = backend.add_user(recent);

        for _ in 0..3 {
            backend.add_task(task_due(elapsed.id, None, TaskStatus::Pending));
            backend.add_task(task_due(recent.id, None, TaskStatus::InProgress));
        }

        let scanner = inactivity_scanner(&backend, Arc::new(RecordingMailer::default()));
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.candidates, 1);
        assert_eq!(outcome.notified, 1);

        let notifications = backend.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, elapsed.id);
        assert!(notifications[0].message.contains("3 pending tasks"));
        drop(notifications);

        assert_eq!(backend.user_by_id(elapsed.id).inactivity_notified_at, Some(now));
        assert_eq!(
            backend.user_by_id(recent.id).inactivity_notified_at,
            Some(now - Duration::minutes(30))
        );
    }

    #[tokio::test]
    async fn recently_seen_user_is_not_a_candidate() {
        let backend = Arc::new(MemBackend::default());
        let active = idle_user(&backend, "active@example.com", Duration::hours(1));
        backend.add_task(task_due(active.id, None, TaskStatus::Pending));

        let scanner = inactivity_scanner(&backend, Arc::new(RecordingMailer::default()));
        let outcome = scanner.scan(Utc::now()).await.unwrap();

        assert_eq!(outcome.candidates, 0);
    }

    #[tokio::test]
    async fn email_failure_still_stamps_the_cool_down() {
        let backend = Arc::new(MemBackend::default());
        let candidate = idle_user(&backend, "bounce@example.com", Duration::hours(4));
        backend.add_task(task_due(candidate.id, None, TaskStatus::Pending));

        let scanner = inactivity_scanner(&backend, Arc::new(FailingMailer));
        let now = Utc::now();
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.notified, 1);
        assert_eq!(backend.notifications.lock().unwrap().len(), 1);
        assert_eq!(backend.user_by_id(candidate.id).inactivity_notified_at, Some(now));
    }
}
