/// Nightly project status refresh
///
/// The scheduler sleeps until the next local midnight, runs
/// [`refresh_all_project_statuses`], and repeats until its cancellation
/// token fires. One run also happens at startup when configured.
///
/// # Single flight
///
/// At most one refresh runs at a time per scheduler. A run that starts while
/// another holds the guard (a manual trigger during the nightly pass, say)
/// is skipped and reported as [`RunOutcome::Skipped`]; it does not queue.
///
/// # Example
///
/// ```no_run
/// use teamhub_worker::config::SchedulerConfig;
/// use teamhub_worker::scheduler::StatusScheduler;
///
/// # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
/// let scheduler = StatusScheduler::new(pool, SchedulerConfig::default())?;
/// let shutdown = scheduler.shutdown_token();
///
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// scheduler.run().await;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use teamhub_shared::status::{local_today, refresh_all_project_statuses, RefreshSummary};

use crate::config::SchedulerConfig;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time from `now` until the next midnight in `offset`, in `(0, 24h]`
///
/// Exactly at midnight the answer is a full day, never zero.
pub fn duration_until_next_midnight(now: DateTime<Utc>, offset: FixedOffset) -> Duration {
    let local = now.with_timezone(&offset).naive_local();

    let next_midnight = match local.date().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(midnight) => midnight,
        None => return ONE_DAY,
    };

    (next_midnight - local)
        .to_std()
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(ONE_DAY)
}

/// Non-queueing mutual exclusion for async jobs
///
/// Scoped to one process. Across processes the versioned status writes keep
/// overlapping passes from clobbering each other.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    lock: Arc<Mutex<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` unless another job holds the guard; `None` means skipped
    pub async fn run<F, T>(&self, job: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _guard = self.lock.try_lock().ok()?;
        Some(job.await)
    }

    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

/// Result of one trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Completed(RefreshSummary),
    /// Another run was in progress
    Skipped,
    /// The scan itself failed; nothing was retried
    Failed { message: String },
}

#[derive(Clone)]
pub struct StatusScheduler {
    pool: PgPool,
    run_on_startup: bool,
    offset: FixedOffset,
    guard: SingleFlight,
    shutdown_token: CancellationToken,
}

impl StatusScheduler {
    pub fn new(pool: PgPool, config: SchedulerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pool,
            run_on_startup: config.run_on_startup,
            offset: config.offset()?,
            guard: SingleFlight::new(),
            shutdown_token: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Whether a refresh is in progress right now
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Current date in the configured zone
    pub fn today(&self) -> NaiveDate {
        local_today(Utc::now(), self.offset)
    }

    /// Refreshes every project status as of today in the configured zone
    pub async fn trigger_now(&self) -> RunOutcome {
        let today = self.today();

        let result = self
            .guard
            .run(refresh_all_project_statuses(&self.pool, today))
            .await;

        match result {
            None => {
                warn!("Status refresh already running, skipping this trigger");
                RunOutcome::Skipped
            }
            Some(Ok(summary)) => RunOutcome::Completed(summary),
            Some(Err(e)) => {
                error!(error = %e, "Status refresh failed");
                RunOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Runs until the shutdown token is cancelled
    pub async fn run(&self) {
        info!(offset = %self.offset, "Status scheduler started");

        if self.run_on_startup {
            info!("Running startup status refresh");
            self.trigger_now().await;
        }

        loop {
            let wait = duration_until_next_midnight(Utc::now(), self.offset);
            debug!(seconds = wait.as_secs(), "Next status refresh scheduled");

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Status scheduler stopping");
                    break;
                }
                _ = sleep(wait) => {
                    info!("Running daily scheduled task...");
                    self.trigger_now().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::sync::oneshot;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_exactly_midnight_waits_full_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(duration_until_next_midnight(now, utc()), ONE_DAY);
    }

    #[test]
    fn test_one_second_before_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 23, 59, 59).unwrap();
        assert_eq!(duration_until_next_midnight(now, utc()), Duration::from_secs(1));
    }

    #[test]
    fn test_offset_shifts_midnight() {
        // 22:00 UTC is 00:00 at +02:00, so a full day remains there
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 22, 0, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(duration_until_next_midnight(now, plus_two), ONE_DAY);
        assert_eq!(duration_until_next_midnight(now, utc()), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_always_within_one_day() {
        let start = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        for minutes in (0..48 * 60).step_by(37) {
            let now = start + chrono::Duration::minutes(minutes);
            let wait = duration_until_next_midnight(now, utc());
            assert!(wait > Duration::ZERO && wait <= ONE_DAY, "{:?} at {}", wait, now);
        }
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let guard = SingleFlight::new();
        let (release, wait_for_release) = oneshot::channel::<()>();
        let (started, wait_for_start) = oneshot::channel::<()>();

        let first = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run(async move {
                        started.send(()).ok();
                        wait_for_release.await.ok();
                        "first"
                    })
                    .await
            })
        };

        wait_for_start.await.unwrap();
        assert!(guard.is_running());
        assert_eq!(guard.run(async { "second" }).await, None);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Some("first"));

        assert!(!guard.is_running());
        assert_eq!(guard.run(async { "third" }).await, Some("third"));
    }
}
