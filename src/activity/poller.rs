//! Task Poller
//!
//! Turns an asynchronous appliance operation into a call with a bounded wait:
//! re-fetch the task every `interval` until it reaches a terminal state or
//! `timeout` has elapsed.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use super::error::ActivityError;
use super::task::{Task, TaskPhase, TaskState};

/// Original call sites waited up to 10 minutes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Fixed delay between two fetches of the same task
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can fetch the current representation of a task
///
/// Fetching must have no side effect on the appliance.
pub trait TaskSource {
    fn fetch_task(&self, uri: &str) -> impl Future<Output = anyhow::Result<Task>> + Send;
}

/// Timeout and interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_secs(timeout: u64, interval: u64) -> Self {
        Self::new(Duration::from_secs(timeout), Duration::from_secs(interval))
    }

    /// Reject policies that would never wait or never sleep
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout.is_zero() {
            anyhow::bail!("Poll timeout must be greater than zero");
        }
        if self.interval.is_zero() {
            anyhow::bail!("Poll interval must be greater than zero");
        }
        Ok(())
    }

    /// Upper bound on the number of fetches one wait can make
    pub fn max_fetches(&self) -> u64 {
        let timeout = self.timeout.as_millis();
        let interval = self.interval.as_millis().max(1);
        timeout.div_ceil(interval) as u64
    }
}

/// One observation of a task while it is being waited on
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub uri: String,
    pub state: TaskState,
    pub status: Option<String>,
    pub percent_complete: Option<u8>,
    pub elapsed: Duration,
    /// 1-based fetch counter
    pub attempt: u32,
}

/// Receives a progress observation after every fetch
pub trait ProgressSink: Send + Sync {
    fn observe(&self, progress: &TaskProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&TaskProgress) + Send + Sync,
{
    fn observe(&self, progress: &TaskProgress) {
        self(progress)
    }
}

/// Logs every observation at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn observe(&self, progress: &TaskProgress) {
        tracing::info!(
            uri = %progress.uri,
            state = %progress.state,
            percent = progress.percent_complete.unwrap_or(0),
            elapsed_ms = progress.elapsed.as_millis() as u64,
            attempt = progress.attempt,
            "{}",
            progress.status.as_deref().unwrap_or("waiting for task")
        );
    }
}

/// Wait for `initial` to reach a terminal state
///
/// Returns the appliance's terminal task body on success. A failed fetch is
/// surfaced immediately, a terminal error state becomes
/// [`ActivityError::TaskFailed`], and running past `policy.timeout` becomes
/// [`ActivityError::Timeout`] carrying the last snapshot. The task keeps
/// running server-side after a timeout.
pub async fn await_task<S>(
    source: &S,
    initial: &Task,
    policy: &PollPolicy,
    sink: Option<&dyn ProgressSink>,
) -> Result<Task, ActivityError>
where
    S: TaskSource + ?Sized,
{
    if initial.uri.is_empty() {
        return Err(ActivityError::MissingLocator);
    }
    policy
        .validate()
        .map_err(|e| ActivityError::InvalidPolicy(e.to_string()))?;

    let uri = initial.uri.as_str();
    let started = Instant::now();
    // A fetch still in flight past this point is abandoned
    let fetch_deadline = started.checked_add(policy.timeout.saturating_add(policy.interval));
    let mut last = initial.clone();
    let mut attempt: u32 = 0;

    tracing::debug!(
        "Waiting on task {} (timeout {:?}, interval {:?})",
        uri,
        policy.timeout,
        policy.interval
    );

    loop {
        attempt += 1;
        let task = match fetch_deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, source.fetch_task(uri)).await {
                Ok(fetched) => fetched?,
                Err(_) => return Err(timed_out(uri, started, last)),
            },
            None => source.fetch_task(uri).await?,
        };

        if let Some(sink) = sink {
            sink.observe(&TaskProgress {
                uri: uri.to_string(),
                state: task.state.clone(),
                status: task.task_status.clone(),
                percent_complete: task.percent_complete,
                elapsed: started.elapsed(),
                attempt,
            });
        }

        match task.state.phase() {
            TaskPhase::Succeeded => {
                if task.state == TaskState::Warning {
                    tracing::warn!(
                        "Task {} completed with warnings: {}",
                        uri,
                        task.task_status.as_deref().unwrap_or("-")
                    );
                } else {
                    tracing::info!("Task {} completed after {} fetches", uri, attempt);
                }
                return Ok(task);
            }
            TaskPhase::Failed => {
                tracing::error!("Task {} ended in state {}", uri, task.state);
                return Err(ActivityError::failed(task));
            }
            TaskPhase::Pending => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(timed_out(uri, started, task));
        }

        tokio::time::sleep(policy.interval.min(policy.timeout - elapsed)).await;

        if started.elapsed() >= policy.timeout {
            return Err(timed_out(uri, started, task));
        }
        last = task;
    }
}

fn timed_out(uri: &str, started: Instant, last: Task) -> ActivityError {
    let waited = started.elapsed();
    tracing::warn!("Gave up on task {} after {:?}", uri, waited);
    ActivityError::Timeout {
        uri: uri.to_string(),
        waited,
        last: Box::new(last),
    }
}
