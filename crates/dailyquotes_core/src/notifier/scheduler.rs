//! Host scheduler for periodic background jobs.
//!
//! # Invariants
//! - At most one live task per job name (KEEP policy on re-schedule).
//! - A job that asks for `Retry` is re-run after an exponential backoff,
//!   never later than its regular interval.

use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(30);

/// Result reported by one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    /// Try again later; the scheduler decides when.
    Retry,
}

#[async_trait]
pub trait PeriodicJob: Send + Sync {
    async fn run(&self) -> JobOutcome;
}

/// Exponential backoff for retried runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based), capped at `ceiling`.
    pub fn delay(&self, attempt: u32, ceiling: Duration) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial.saturating_mul(factor).min(ceiling)
    }
}

/// Named periodic tasks on the current tokio runtime.
#[derive(Default)]
pub struct JobScheduler {
    backoff: BackoffPolicy,
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            backoff,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Starts `job` now and then every `interval`, unless a live job with
    /// the same name exists. Returns whether a new task was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_unique_periodic(
        &self,
        name: &str,
        interval: Duration,
        job: Arc<dyn PeriodicJob>,
    ) -> bool {
        let mut jobs = self.lock();
        if jobs.get(name).is_some_and(|handle| !handle.is_finished()) {
            debug!("event=job_schedule module=notifier status=kept job={name}");
            return false;
        }

        let backoff = self.backoff;
        let job_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut attempt = 0u32;
            loop {
                let wait = match job.run().await {
                    JobOutcome::Success => {
                        attempt = 0;
                        interval
                    }
                    JobOutcome::Retry => {
                        attempt = attempt.saturating_add(1);
                        backoff.delay(attempt, interval)
                    }
                };
                debug!(
                    "event=job_wait module=notifier status=ok job={} attempt={} wait_ms={}",
                    job_name,
                    attempt,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
        });
        jobs.insert(name.to_string(), handle);
        info!(
            "event=job_schedule module=notifier status=ok job={name} interval_secs={}",
            interval.as_secs()
        );
        true
    }

    /// Stops the named job. Returns whether one was running.
    pub fn cancel(&self, name: &str) -> bool {
        let Some(handle) = self.lock().remove(name) else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();
        info!("event=job_cancel module=notifier status=ok job={name}");
        was_running
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops every job.
    pub fn cancel_all(&self) {
        for (_, handle) in self.lock().drain() {
            handle.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::{BackoffPolicy, JobOutcome, JobScheduler, PeriodicJob};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct ScriptedJob {
        outcomes: Mutex<VecDeque<JobOutcome>>,
        runs: AtomicUsize,
    }

    impl ScriptedJob {
        fn new(outcomes: &[JobOutcome]) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                runs: AtomicUsize::new(0),
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PeriodicJob for ScriptedJob {
        async fn run(&self) -> JobOutcome {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(JobOutcome::Success)
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = BackoffPolicy {
            initial: Duration::from_secs(30),
        };
        let cap = Duration::from_secs(15 * 60);
        assert_eq!(policy.delay(1, cap), Duration::from_secs(30));
        assert_eq!(policy.delay(2, cap), Duration::from_secs(60));
        assert_eq!(policy.delay(3, cap), Duration::from_secs(120));
        assert_eq!(policy.delay(10, cap), cap);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_runs_after_backoff_then_waits_interval() {
        let scheduler = JobScheduler::default();
        let job = ScriptedJob::new(&[JobOutcome::Retry, JobOutcome::Success]);
        assert!(scheduler.schedule_unique_periodic(
            "daily",
            Duration::from_secs(15 * 60),
            job.clone()
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(job.runs(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(job.runs(), 2);

        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        assert_eq!(job.runs(), 2);

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        assert_eq!(job.runs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_policy_and_cancel() {
        let scheduler = JobScheduler::default();
        let first = ScriptedJob::new(&[]);
        let second = ScriptedJob::new(&[]);
        let interval = Duration::from_secs(60);

        assert!(scheduler.schedule_unique_periodic("daily", interval, first.clone()));
        assert!(!scheduler.schedule_unique_periodic("daily", interval, second.clone()));
        assert!(scheduler.is_scheduled("daily"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(first.runs(), 1);
        assert_eq!(second.runs(), 0);

        assert!(scheduler.cancel("daily"));
        assert!(!scheduler.is_scheduled("daily"));
        assert!(!scheduler.cancel("daily"));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(first.runs(), 1);
    }
}
