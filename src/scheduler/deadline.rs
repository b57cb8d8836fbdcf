//! Deadline scanner: finds tasks due within the look-ahead window and
//! creates at most one deadline notification per (user, task) per day.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::notification::dispatch::{Notifier, NotifyEvent};
use crate::notification::NotificationKind;
use crate::task::Task;

use super::store::{NotificationStore, TaskStore, UserStore};

/// What a single scan tick did. Candidates that were already notified today,
/// had a missing owner, or failed individually all count as skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub candidates: usize,
    pub notified: usize,
    pub skipped: usize,
}

pub struct DeadlineScanner {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
    notifier: Notifier,
    lookahead: Duration,
}

impl DeadlineScanner {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        notifications: Arc<dyn NotificationStore>,
        notifier: Notifier,
        lookahead: Duration,
    ) -> Self {
        Self {
            tasks,
            users,
            notifications,
            notifier,
            lookahead,
        }
    }

    /// One deadline sweep over `[now, now + lookahead]`.
    ///
    /// `now` is sampled once by the caller: the dedup day-start derived from
    /// it is shared by every candidate, so a run straddling midnight cannot
    /// use two different windows.
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<ScanOutcome> {
        let window_end = now + self.lookahead;
        let day_start = start_of_day(now);

        let due_tasks = self.tasks.find_due_between(now, window_end).await?;

        let mut outcome = ScanOutcome {
            candidates: due_tasks.len(),
            ..Default::default()
        };

        for task in &due_tasks {
            match self.process_task(task, day_start).await {
                Ok(true) => outcome.notified += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    outcome.skipped += 1;
                    warn!(task = %task.id, "deadline candidate failed, continuing: {e}");
                }
            }
        }

        Ok(outcome)
    }

    /// Returns Ok(true) when a notification was created for this task.
    async fn process_task(&self, task: &Task, day_start: DateTime<Utc>) -> Result<bool> {
        let already_notified = self
            .notifications
            .exists_since(task.user_id, task.id, NotificationKind::Deadline, day_start)
            .await?;

        if already_notified {
            debug!(task = %task.id, "already reminded today");
            return Ok(false);
        }

        let Some(owner) = self.users.find_by_id(task.user_id).await? else {
            warn!(task = %task.id, "task owner missing, skipping");
            return Ok(false);
        };

        let Some(due_date) = task.due_date else {
            // The due-window query should never return these.
            warn!(task = %task.id, "candidate without due date, skipping");
            return Ok(false);
        };

        self.notifier
            .notify(
                &owner,
                NotifyEvent::Deadline {
                    task_id: task.id,
                    task_title: task.title.clone(),
                    due_date,
                },
            )
            .await?;

        Ok(true)
    }
}

/// Start of the calendar day (UTC) containing `now`.
pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{
        deadline_scanner, task_due, user, FailingMailer, MemBackend, RecordingMailer,
    };
    use crate::task::TaskStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn second_scan_same_day_creates_no_duplicate() {
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("idem@example.com"));
        let now = Utc::now();
        backend.add_task(task_due(owner.id, Some(now + Duration::hours(2)), TaskStatus::Pending));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);

        let first = scanner.scan(now).await.unwrap();
        assert_eq!(first.notified, 1);

        let second = scanner.scan(now).await.unwrap();
        assert_eq!(second.notified, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(backend.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn window_boundaries_are_inclusive() {
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("edge@example.com"));
        let now = Utc::now();

        let at_now = backend.add_task(task_due(owner.id, Some(now), TaskStatus::Pending));
        backend.add_task(task_due(
            owner.id,
            Some(now - Duration::seconds(1)),
            TaskStatus::Pending,
        ));
        let at_end = backend.add_task(task_due(
            owner.id,
            Some(now + Duration::hours(24)),
            TaskStatus::Pending,
        ));
        backend.add_task(task_due(
            owner.id,
            Some(now + Duration::hours(24) + Duration::seconds(1)),
            TaskStatus::Pending,
        ));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.candidates, 2);
        assert_eq!(outcome.notified, 2);

        let notified_tasks: Vec<Option<Uuid>> = backend
            .notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.task_id)
            .collect();
        assert!(notified_tasks.contains(&Some(at_now.id)));
        assert!(notified_tasks.contains(&Some(at_end.id)));
    }

    #[tokio::test]
    async fn completed_tasks_are_never_candidates() {
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("done@example.com"));
        let now = Utc::now();
        backend.add_task(task_due(
            owner.id,
            Some(now + Duration::hours(1)),
            TaskStatus::Completed,
        ));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome, ScanOutcome::default());
        assert!(backend.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tasks_without_due_date_are_never_candidates() {
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("nodue@example.com"));
        backend.add_task(task_due(owner.id, None, TaskStatus::Pending));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(Utc::now()).await.unwrap();

        assert_eq!(outcome.candidates, 0);
    }

    #[tokio::test]
    async fn pending_notified_completed_skipped() {
        // Scan at T with task A due T+30min (pending) and B due T+30min
        // (completed): exactly one notification, for A.
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("mixed@example.com"));
        let now = Utc::now();
        let a = backend.add_task(task_due(
            owner.id,
            Some(now + Duration::minutes(30)),
            TaskStatus::Pending,
        ));
        backend.add_task(task_due(
            owner.id,
            Some(now + Duration::minutes(30)),
            TaskStatus::Completed,
        ));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.notified, 1);
        let notifications = backend.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].task_id, Some(a.id));
        assert_eq!(notifications[0].kind, NotificationKind::Deadline);
    }

    #[tokio::test]
    async fn broken_mailer_still_persists_the_record() {
        // "Ship report" due in 2 hours; the mailer always throws; the in-app
        // record must exist after the run and no error may escape the scan.
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("ship@example.com"));
        let now = Utc::now();
        let mut task = task_due(owner.id, Some(now + Duration::hours(2)), TaskStatus::Pending);
        task.title = "Ship report".to_string();
        backend.add_task(task);

        // Deadline emails enabled so the failing send path actually runs.
        let scanner = deadline_scanner(&backend, Arc::new(FailingMailer), true);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.notified, 1);
        let notifications = backend.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("Ship report"));
    }

    #[tokio::test]
    async fn yesterdays_reminder_does_not_suppress_todays() {
        let backend = Arc::new(MemBackend::default());
        let owner = backend.add_user(user("daily@example.com"));
        let now = Utc::now();
        let task = backend.add_task(task_due(
            owner.id,
            Some(now + Duration::hours(3)),
            TaskStatus::Pending,
        ));

        backend.seed_notification(owner.id, Some(task.id), NotificationKind::Deadline, now - Duration::days(1));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.notified, 1);
        assert_eq!(backend.notifications.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_owner_is_skipped_not_fatal() {
        let backend = Arc::new(MemBackend::default());
        let now = Utc::now();
        backend.add_task(task_due(
            Uuid::new_v4(),
            Some(now + Duration::hours(1)),
            TaskStatus::Pending,
        ));

        let scanner = deadline_scanner(&backend, Arc::new(RecordingMailer::default()), false);
        let outcome = scanner.scan(now).await.unwrap();

        assert_eq!(outcome.candidates, 1);
        assert_eq!(outcome.notified, 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn start_of_day_floors_to_midnight() {
        let now = "2026-08-07T15:42:10Z".parse::<DateTime<Utc>>().unwrap();
        let floor = start_of_day(now);
        assert_eq!(floor, "2026-08-07T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
