//! Owns the two scan timers and the only process-wide mutable state in this
//! subsystem: per-scanner run state and last-run timestamps.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::notification::dispatch::Notifier;
use crate::state::AppState;

use super::deadline::DeadlineScanner;
use super::inactivity::InactivityScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
}

/// Per-scanner run state. A tick that arrives while the previous run is
/// still in flight is dropped, never queued, so a scanner can never overlap
/// with itself.
pub struct ScanGuard {
    name: &'static str,
    state: Mutex<ScanState>,
    last_run: Mutex<Option<DateTime<Utc>>>,
}

impl ScanGuard {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            state: Mutex::new(ScanState::Idle),
            last_run: Mutex::new(None),
        })
    }

    /// Claim the scanner for one run. `None` means a run is already in
    /// flight and this tick should be dropped. The returned token releases
    /// the guard and records the run time when it goes out of scope.
    pub fn begin(&self) -> Option<RunningScan<'_>> {
        let mut state = self.state.lock().unwrap();
        if *state == ScanState::Running {
            return None;
        }
        *state = ScanState::Running;
        Some(RunningScan { guard: self })
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap()
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.lock().unwrap()
    }
}

pub struct RunningScan<'a> {
    guard: &'a ScanGuard,
}

impl Drop for RunningScan<'_> {
    fn drop(&mut self) {
        *self.guard.last_run.lock().unwrap() = Some(Utc::now());
        *self.guard.state.lock().unwrap() = ScanState::Idle;
    }
}

/// Wire both scanners onto their timers and start ticking.
pub async fn start_scheduler(state: AppState) -> Result<()> {
    let scheduler = JobScheduler::new().await?;

    let notifier = state.notifier.clone();

    let deadline_scanner = Arc::new(DeadlineScanner::new(
        Arc::new(state.task_repository.clone()),
        Arc::new(state.user_repository.clone()),
        Arc::new(state.notification_repository.clone()),
        notifier.clone(),
        Duration::hours(state.config.deadline_lookahead_hours),
    ));
    let deadline_guard = ScanGuard::new("deadline");

    let deadline_job = Job::new_repeated_async(
        state.config.deadline_scan_interval,
        move |_uuid, _lock| {
            let scanner = deadline_scanner.clone();
            let guard = deadline_guard.clone();

            Box::pin(async move {
                let Some(_run) = guard.begin() else {
                    warn!(
                        "{} scan still running (last completed: {:?}), tick dropped",
                        guard.name,
                        guard.last_run()
                    );
                    return;
                };

                match scanner.scan(Utc::now()).await {
                    Ok(outcome) => info!(
                        candidates = outcome.candidates,
                        notified = outcome.notified,
                        skipped = outcome.skipped,
                        "deadline scan finished"
                    ),
                    Err(e) => error!("deadline scan failed: {e}"),
                }
            })
        },
    )?;
    scheduler.add(deadline_job).await?;

    let inactivity_scanner = Arc::new(build_inactivity_scanner(&state, notifier));
    let inactivity_guard = ScanGuard::new("inactivity");

    let inactivity_job = Job::new_repeated_async(
        state.config.inactivity_scan_interval,
        move |_uuid, _lock| {
            let scanner = inactivity_scanner.clone();
            let guard = inactivity_guard.clone();

            Box::pin(async move {
                let Some(_run) = guard.begin() else {
                    warn!(
                        "{} scan still running (last completed: {:?}), tick dropped",
                        guard.name,
                        guard.last_run()
                    );
                    return;
                };

                match scanner.scan(Utc::now()).await {
                    Ok(outcome) => info!(
                        candidates = outcome.candidates,
                        notified = outcome.notified,
                        skipped = outcome.skipped,
                        "inactivity scan finished"
                    ),
                    Err(e) => error!("inactivity scan failed: {e}"),
                }
            })
        },
    )?;
    scheduler.add(inactivity_job).await?;

    scheduler.start().await?;
    info!("background scanners started");

    Ok(())
}

fn build_inactivity_scanner(state: &AppState, notifier: Notifier) -> InactivityScanner {
    InactivityScanner::new(
        Arc::new(state.user_repository.clone()),
        Arc::new(state.task_repository.clone()),
        Arc::new(state.activity_repository.clone()),
        notifier,
        Duration::minutes(state.config.idle_threshold_minutes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_guard_drops_the_second_begin() {
        let guard = ScanGuard::new("test");
        assert_eq!(guard.state(), ScanState::Idle);

        let run = guard.begin().expect("idle guard must yield a token");
        assert_eq!(guard.state(), ScanState::Running);
        assert!(guard.begin().is_none(), "overlapping tick must be dropped");

        drop(run);
        assert_eq!(guard.state(), ScanState::Idle);
        assert!(guard.last_run().is_some());
        assert!(guard.begin().is_some(), "guard must be reusable after release");
    }

    #[test]
    fn independent_guards_do_not_interfere() {
        let deadline = ScanGuard::new("deadline");
        let inactivity = ScanGuard::new("inactivity");

        let _run = deadline.begin().unwrap();
        assert_eq!(inactivity.state(), ScanState::Idle);
        assert!(inactivity.begin().is_some());
    }
}
