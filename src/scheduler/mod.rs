//! Deadline-driven job coordinator.
//!
//! A single coordinator loop sleeps until the earliest deadline in the
//! [`JobQueue`], hands due jobs to worker tasks (bounded by a semaphore, each
//! under a timeout), and receives every outcome back on one channel. Failures
//! are logged and written to the store under `errors`; if that write fails the
//! loop stops with an error.

pub mod clock;
pub mod error;
pub mod jobs;
pub mod queue;
pub mod trigger;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify, Semaphore};

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{JobError, ScheduleError};
pub use jobs::{blocking_job, job_fn, JobContext, JobFn};
pub use queue::{JobId, JobQueue, JobSummary};
pub use trigger::Trigger;

use crate::config::SchedulerConfig;
use crate::integrations::PlatformIntegrator;
use crate::memory::types::category;
use crate::memory::Facade;

/// Result of one job run, sent back to the coordinator.
#[derive(Debug)]
pub struct JobOutcome {
    pub id: JobId,
    pub name: String,
    pub result: Result<(), JobError>,
    pub elapsed: Duration,
}

#[derive(Debug, Serialize)]
pub struct ScheduleStatus {
    pub running: bool,
    pub scheduled_jobs: usize,
    pub custom_jobs: usize,
    pub next_run: Option<NaiveDateTime>,
    pub jobs: Vec<JobSummary>,
}

pub struct Scheduler {
    facade: Arc<Facade>,
    integrator: Arc<PlatformIntegrator>,
    settings: SchedulerConfig,
    clock: Arc<dyn Clock>,
    queue: Mutex<JobQueue>,
    wake: Notify,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(
        facade: Arc<Facade>,
        integrator: Arc<PlatformIntegrator>,
        settings: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            facade,
            integrator,
            settings,
            clock,
            queue: Mutex::new(JobQueue::default()),
            wake: Notify::new(),
            running: AtomicBool::new(false),
        }
    }

    fn queue(&self) -> Result<MutexGuard<'_, JobQueue>> {
        self.queue
            .lock()
            .map_err(|_| anyhow!("scheduler queue lock poisoned"))
    }

    /// Add a job. Returns `None` if the trigger has no future fire time.
    pub fn register(
        &self,
        name: &str,
        description: &str,
        trigger: Trigger,
        custom: bool,
        action: JobFn,
    ) -> Result<Option<JobId>> {
        let now = self.clock.now();
        let id = self
            .queue()?
            .insert(name, description, trigger, custom, action, now);
        match id {
            Some(id) => {
                tracing::debug!(job = name, id, trigger = %trigger, "job registered");
                self.wake.notify_one();
            }
            None => tracing::warn!(job = name, trigger = %trigger, "trigger never fires; not registered"),
        }
        Ok(id)
    }

    pub fn unregister(&self, id: JobId) -> Result<bool> {
        Ok(self.queue()?.remove(id))
    }

    /// Register a caller-supplied job from a `(frequency, time spec)` pair.
    /// A malformed time spec is returned to the caller, not caught.
    pub fn add_custom(
        &self,
        frequency: &str,
        time_spec: &str,
        description: &str,
        action: JobFn,
    ) -> Result<JobId, CustomJobError> {
        let trigger = Trigger::parse(frequency, time_spec)?;
        let name = self.queue()?.next_custom_name();
        self.register(&name, description, trigger, true, action)?
            .ok_or_else(|| CustomJobError::Store(anyhow!("trigger {trigger} never fires")))
    }

    /// The maintenance jobs, the question generator, and the platform health check.
    pub fn register_defaults(&self) -> Result<(), CustomJobError> {
        let s = &self.settings;
        let defaults = [
            (
                "daily_update",
                "Daily report with autonomous insights",
                Trigger::daily(&s.daily_report_time)?,
                blocking_job(jobs::daily_update),
            ),
            (
                "repo_check",
                "Repository check placeholder task",
                Trigger::hours(s.repo_check_hours)?,
                blocking_job(jobs::repo_check),
            ),
            (
                "learning_analysis",
                "Success rate over the last 10 learning events",
                Trigger::hours(s.learning_analysis_hours)?,
                blocking_job(jobs::learning_analysis),
            ),
            (
                "memory_cleanup",
                "Weekly cleanup report",
                Trigger::weekly(&s.cleanup_day, &s.cleanup_time)?,
                blocking_job(jobs::memory_cleanup),
            ),
            (
                "improvement_check",
                "Self-improvement heuristics",
                Trigger::hours(s.improvement_hours)?,
                blocking_job(jobs::self_improvement),
            ),
            (
                "question_gen",
                "Contextual question task",
                Trigger::hours(s.question_interval_hours)?,
                blocking_job(jobs::question),
            ),
            (
                "platform_health",
                "Mark configured platforms online",
                Trigger::minutes(s.health_check_minutes)?,
                blocking_job(jobs::platform_health),
            ),
        ];

        for (name, description, trigger, action) in defaults {
            self.register(name, description, trigger, false, action)?;
        }
        tracing::info!(jobs = self.queue()?.len(), "default schedule registered");
        Ok(())
    }

    /// One-shot reminder: at `at` (local time), create a priority-9 task.
    pub fn create_reminder(&self, title: &str, message: &str, at: NaiveDateTime) -> Result<String> {
        self.register(
            &format!("reminder_{title}"),
            message,
            Trigger::Once { at },
            true,
            jobs::reminder(title, message),
        )?;
        Ok(format!("Reminder set for {}", at.format("%Y-%m-%d %H:%M")))
    }

    pub fn status(&self) -> Result<ScheduleStatus> {
        let queue = self.queue()?;
        Ok(ScheduleStatus {
            running: self.running.load(Ordering::SeqCst),
            scheduled_jobs: queue.len(),
            custom_jobs: queue.custom_count(),
            next_run: queue.next_deadline(),
            jobs: queue.summaries(),
        })
    }

    fn context(&self) -> JobContext {
        JobContext {
            facade: Arc::clone(&self.facade),
            integrator: Arc::clone(&self.integrator),
            fired_at: Utc::now(),
        }
    }

    fn dispatch(
        &self,
        due: queue::DueJob,
        permits: &Arc<Semaphore>,
        outcomes: &mpsc::UnboundedSender<JobOutcome>,
    ) {
        let permits = Arc::clone(permits);
        let outcomes = outcomes.clone();
        let timeout = Duration::from_secs(self.settings.job_timeout_secs.max(1));
        let ctx = self.context();

        tracing::debug!(job = %due.name, deadline = %due.deadline, "dispatching");
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let started = Instant::now();
            let mut worker = tokio::spawn((due.action)(ctx));
            let result = match tokio::time::timeout(timeout, &mut worker).await {
                Ok(Ok(result)) => result,
                Ok(Err(join)) => Err(JobError::Panicked(join.to_string())),
                Err(_) => {
                    worker.abort();
                    Err(JobError::Timeout(timeout))
                }
            };
            let _ = outcomes.send(JobOutcome {
                id: due.id,
                name: due.name,
                result,
                elapsed: started.elapsed(),
            });
        });
    }

    /// Log every outcome; record failures in the store. Errors here are fatal.
    fn handle_outcome(&self, outcome: JobOutcome) -> Result<()> {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match outcome.result {
            Ok(()) => {
                tracing::info!(job = %outcome.name, elapsed_ms, "job completed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(job = %outcome.name, elapsed_ms, error = %e, "job failed");
                self.facade
                    .save(
                        &format!("{}_error", outcome.name),
                        json!({
                            "job": outcome.name,
                            "error": e.to_string(),
                            "timestamp": Utc::now().to_rfc3339(),
                        }),
                        category::ERRORS,
                    )
                    .with_context(|| format!("recording failure of job {}", outcome.name))
            }
        }
    }

    /// Run until `shutdown` resolves or a job failure cannot be recorded.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let max_idle = Duration::from_secs(self.settings.max_idle_secs.max(1));
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrent_jobs.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::pin!(shutdown);

        self.running.store(true, Ordering::SeqCst);
        tracing::info!(jobs = self.queue()?.len(), "scheduler started");

        let result = loop {
            let now = self.clock.now();
            let (due, next) = {
                let mut queue = self.queue()?;
                let due = queue.pop_due(now);
                (due, queue.next_deadline())
            };
            for job in due {
                self.dispatch(job, &permits, &tx);
            }

            let sleep_for = next.map_or(max_idle, |at| {
                (at - now).to_std().unwrap_or(Duration::ZERO).min(max_idle)
            });

            tokio::select! {
                _ = &mut shutdown => break Ok(()),
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(sleep_for) => {}
                Some(outcome) = rx.recv() => {
                    if let Err(e) = self.handle_outcome(outcome) {
                        tracing::error!(error = %e, "cannot record job failure; stopping scheduler");
                        break Err(e);
                    }
                }
            }
        };

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("scheduler stopped");
        result
    }
}

/// Failure to add a job: either a bad trigger description or a store problem.
#[derive(Debug, thiserror::Error)]
pub enum CustomJobError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
