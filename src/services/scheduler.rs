use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant, Interval, interval, interval_at};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::domain::JobName;
use crate::domain::events::NotificationEvent;
use crate::services::jobs;
use crate::state::SharedState;

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// One in-progress flag per job, indexed like `JobName::ALL`.
struct JobGuards {
    flags: Vec<AtomicBool>,
}

impl JobGuards {
    fn new() -> Self {
        Self {
            flags: JobName::ALL.iter().map(|_| AtomicBool::new(false)).collect(),
        }
    }

    fn try_acquire(&self, job: JobName) -> Option<GuardHandle<'_>> {
        let index = JobName::ALL.iter().position(|j| *j == job)?;
        let flag = &self.flags[index];
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GuardHandle { flag })
    }
}

struct GuardHandle<'a> {
    flag: &'a AtomicBool,
}

impl Drop for GuardHandle<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: JobName,
    /// True when a previous run of the same job was still in progress.
    pub skipped: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
    guards: Arc<JobGuards>,
}

impl Scheduler {
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
            guards: Arc::new(JobGuards::new()),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if self.config.use_cron {
            self.run_with_cron().await
        } else {
            self.run_with_interval().await
        }
    }

    fn cron_table(&self) -> Vec<(JobName, String)> {
        let mut table = vec![
            (JobName::RotateFreeMovie, self.config.rotate_free_movie_cron.clone()),
            (JobName::TrialExpiry, self.config.trial_expiry_cron.clone()),
            (JobName::MatchReminders, self.config.match_reminders_cron.clone()),
            (
                JobName::ExpireSubscriptions,
                self.config.expire_subscriptions_cron.clone(),
            ),
        ];
        if let Some(cron) = self
            .config
            .fixtures_sync_cron
            .as_ref()
            .filter(|c| !c.trim().is_empty())
        {
            table.push((JobName::SyncFixtures, cron.clone()));
        }
        table
    }

    async fn run_with_cron(&self) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        for (name, cron_expr) in self.cron_table() {
            let state = Arc::clone(&self.state);
            let guards = Arc::clone(&self.guards);
            let running = Arc::clone(&self.running);

            let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
                let state = Arc::clone(&state);
                let guards = Arc::clone(&guards);
                let running = Arc::clone(&running);
                Box::pin(async move {
                    if !*running.read().await {
                        return;
                    }
                    let _ = run_guarded(&state, &guards, name).await;
                })
            })?;

            sched.add(job).await?;
            info!(job_name = %name, cron = %cron_expr, "Job scheduled");
        }

        sched.start().await?;

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let reminder_mins = self.config.reminder_interval_minutes.max(1);
        info!(
            "Scheduler running: reminders every {}m, subscriptions hourly, trials daily, free movie weekly",
            reminder_mins
        );

        let mut reminders = interval(Duration::from_secs(u64::from(reminder_mins) * 60));
        let mut expiry = interval(Duration::from_secs(HOUR_SECS));
        let mut trials = deferred_interval(Duration::from_secs(DAY_SECS));
        let mut rotation = deferred_interval(Duration::from_secs(7 * DAY_SECS));

        loop {
            let job = tokio::select! {
                _ = reminders.tick() => JobName::MatchReminders,
                _ = expiry.tick() => JobName::ExpireSubscriptions,
                _ = trials.tick() => JobName::TrialExpiry,
                _ = rotation.tick() => JobName::RotateFreeMovie,
            };
            if !*self.running.read().await {
                break;
            }

            let state = Arc::clone(&self.state);
            let guards = Arc::clone(&self.guards);
            tokio::spawn(async move {
                let _ = run_guarded(&state, &guards, job).await;
            });
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs one job now, sharing the overlap guard with scheduled runs.
    pub async fn run_job(&self, job: JobName) -> Result<JobReport> {
        run_guarded(&self.state, &self.guards, job).await
    }
}

/// Like [`interval`] but the first tick waits one full period, so a restart
/// does not re-run daily and weekly jobs.
fn deferred_interval(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}

async fn run_guarded(state: &SharedState, guards: &JobGuards, job: JobName) -> Result<JobReport> {
    let Some(_guard) = guards.try_acquire(job) else {
        warn!(event = "job_skipped", job_name = %job, "Previous run still in progress");
        return Ok(JobReport {
            job,
            skipped: true,
            duration_ms: 0,
            result: None,
        });
    };

    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = %job, "Starting scheduled job");
    let _ = state.event_bus.send(NotificationEvent::JobStarted {
        job: job.to_string(),
    });

    let outcome = jobs::execute(state, job).await;
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let _ = state.event_bus.send(NotificationEvent::JobFinished {
        job: job.to_string(),
        duration_ms,
        ok: outcome.is_ok(),
    });

    match outcome {
        Ok(result) => {
            info!(
                event = "job_finished",
                job_name = %job,
                duration_ms,
                "Scheduled job finished"
            );
            Ok(JobReport {
                job,
                skipped: false,
                duration_ms,
                result: Some(result),
            })
        }
        Err(e) => {
            metrics::counter!("jobs_failed_total", "job" => job.as_str()).increment(1);
            error!(event = "job_failed", job_name = %job, error = %e, "Scheduled job failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_overlapping_runs() {
        let guards = JobGuards::new();
        let first = guards.try_acquire(JobName::MatchReminders);
        assert!(first.is_some());
        assert!(guards.try_acquire(JobName::MatchReminders).is_none());
        assert!(guards.try_acquire(JobName::TrialExpiry).is_some());
        drop(first);
        assert!(guards.try_acquire(JobName::MatchReminders).is_some());
    }

    #[tokio::test]
    async fn test_deferred_interval_skips_immediate_tick() {
        let period = Duration::from_millis(60);
        let started = Instant::now();
        let mut ticker = deferred_interval(period);
        ticker.tick().await;
        assert!(started.elapsed() >= period);
    }
}
