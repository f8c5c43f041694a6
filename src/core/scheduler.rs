//! Periodic job scheduling for display slots
//!
//! Every enabled display slot owns one fixed-rate job. Executions of a single
//! job never overlap; cancelling a job is a request that lets an in-flight
//! execution finish.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What a job wants after one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobControl {
    Continue,
    /// Stop scheduling this job
    Cancel,
}

const SHUTDOWN_POLL: Duration = Duration::from_millis(5);

pub type Job = Box<dyn FnMut() -> JobControl + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Handle to a scheduled job
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    token: CancellationToken,
}

impl JobHandle {
    fn new(id: JobId, token: CancellationToken) -> Self {
        Self { id, token }
    }

    fn cancelled(id: JobId) -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { id, token }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Request cancellation; does not wait for a running execution
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `job` now and then every `period` until it is cancelled
    fn schedule_at_fixed_rate(&self, period: Duration, job: Job) -> JobHandle;

    /// Cancel every job and wait up to `timeout` for running executions.
    /// Returns false if the wait timed out.
    fn shutdown(&self, timeout: Duration) -> bool;
}

fn run_guarded(id: JobId, job: &mut Job) -> JobControl {
    match catch_unwind(AssertUnwindSafe(|| job())) {
        Ok(control) => control,
        Err(_) => {
            error!("{} panicked and was cancelled", id);
            JobControl::Cancel
        }
    }
}

/// Scheduler backed by a small multi-threaded tokio runtime
pub struct TokioScheduler {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    root: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new(worker_threads: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("tickhud-display")
            .enable_time()
            .build()
            .context("Failed to build display scheduler runtime")?;
        let handle = runtime.handle().clone();
        debug!("Display scheduler started with {} workers", worker_threads.max(1));

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            root: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| {
            warn!("Scheduler task list mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Number of job tasks that have not finished yet
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_at_fixed_rate(&self, period: Duration, mut job: Job) -> JobHandle {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if self.root.is_cancelled() {
            warn!("Scheduler is shut down, not scheduling {}", id);
            return JobHandle::cancelled(id);
        }

        let token = self.root.child_token();
        let job_token = token.clone();
        let period = period.max(Duration::from_millis(1));

        let task = self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = job_token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                if run_guarded(id, &mut job) == JobControl::Cancel {
                    job_token.cancel();
                    break;
                }
            }
        });

        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);

        JobHandle::new(id, token)
    }

    fn shutdown(&self, timeout: Duration) -> bool {
        self.root.cancel();
        let tasks: Vec<_> = self.tasks().drain(..).collect();
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(runtime) = runtime else {
            return true;
        };

        // No block_on here, callers may be on a runtime thread
        let pending = tasks.len();
        let deadline = Instant::now() + timeout;
        let mut finished = tasks.iter().all(|task| task.is_finished());
        while !finished && Instant::now() < deadline {
            std::thread::sleep(SHUTDOWN_POLL.min(deadline.saturating_duration_since(Instant::now())));
            finished = tasks.iter().all(|task| task.is_finished());
        }
        if finished {
            debug!("Display scheduler stopped ({} jobs)", pending);
        } else {
            error!("Display jobs still running after {:?}, abandoning them", timeout);
        }
        runtime.shutdown_background();
        finished
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.root.cancel();
        if let Some(runtime) = self
            .runtime
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            runtime.shutdown_background();
        }
    }
}

struct ManualJob {
    id: JobId,
    period: Duration,
    next_due: Duration,
    token: CancellationToken,
    /// `None` while the job is executing
    job: Option<Job>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    jobs: Vec<ManualJob>,
    runs: HashMap<JobId, u64>,
    next_id: u64,
    shut_down: bool,
}

/// Deterministic scheduler driven by an explicit clock
///
/// Jobs only run inside [`advance`](Self::advance) or
/// [`run_pending`](Self::run_pending), on the calling thread. Useful in tests
/// and for hosts that want display jobs driven from their own tick loop.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Manual scheduler mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn now(&self) -> Duration {
        self.state().now
    }

    /// Run every job that is due at the current time
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    /// Move the clock forward, running due jobs in order of due time
    pub fn advance(&self, by: Duration) {
        let target = self.state().now + by;

        loop {
            let (id, mut job) = {
                let mut state = self.state();
                state.jobs.retain(|entry| !entry.token.is_cancelled());

                let next = state
                    .jobs
                    .iter_mut()
                    .filter(|entry| entry.job.is_some() && entry.next_due <= target)
                    .min_by_key(|entry| (entry.next_due, entry.id));
                let Some(entry) = next else {
                    state.now = target;
                    return;
                };
                let (id, due) = (entry.id, entry.next_due);
                let Some(job) = entry.job.take() else {
                    return;
                };
                state.now = state.now.max(due);
                (id, job)
            };

            let control = run_guarded(id, &mut job);

            let mut state = self.state();
            *state.runs.entry(id).or_default() += 1;
            if let Some(entry) = state.jobs.iter_mut().find(|entry| entry.id == id) {
                entry.next_due += entry.period;
                if control == JobControl::Cancel {
                    entry.token.cancel();
                } else {
                    entry.job = Some(job);
                }
            }
        }
    }

    /// Executions of one job so far
    pub fn runs(&self, id: JobId) -> u64 {
        self.state().runs.get(&id).copied().unwrap_or(0)
    }

    pub fn total_runs(&self) -> u64 {
        self.state().runs.values().sum()
    }

    /// Jobs scheduled and not cancelled
    pub fn active_jobs(&self) -> usize {
        self.state()
            .jobs
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_at_fixed_rate(&self, period: Duration, job: Job) -> JobHandle {
        let mut state = self.state();
        state.next_id += 1;
        let id = JobId(state.next_id);
        if state.shut_down {
            return JobHandle::cancelled(id);
        }

        let token = CancellationToken::new();
        let now = state.now;
        state.jobs.push(ManualJob {
            id,
            period: period.max(Duration::from_millis(1)),
            next_due: now,
            token: token.clone(),
            job: Some(job),
        });
        JobHandle::new(id, token)
    }

    fn shutdown(&self, _timeout: Duration) -> bool {
        let mut state = self.state();
        state.shut_down = true;
        for entry in state.jobs.drain(..) {
            entry.token.cancel();
        }
        true
    }
}
