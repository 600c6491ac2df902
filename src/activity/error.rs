use std::time::Duration;
use thiserror::Error;

use super::task::{Task, TaskState};

/// Ways waiting on a task can end without success
#[derive(Error, Debug)]
pub enum ActivityError {
    /// The task descriptor has no locator to re-fetch it by
    #[error("task has no uri to poll")]
    MissingLocator,
    /// Timeout or interval of zero
    #[error("invalid poll policy: {0}")]
    InvalidPolicy(String),
    /// Fetching the task failed; not retried
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
    /// The appliance reported a terminal error state
    #[error("task {uri} ended in state {state}: {}", .message.as_deref().unwrap_or("no error detail reported"))]
    TaskFailed {
        uri: String,
        state: TaskState,
        code: Option<String>,
        message: Option<String>,
        task: Box<Task>,
    },
    /// The deadline passed while the task was still running server-side
    #[error("waited {}s for task {uri} to complete, aborting (last state: {})", .waited.as_secs(), .last.state)]
    Timeout {
        uri: String,
        waited: Duration,
        last: Box<Task>,
    },
}

impl ActivityError {
    pub(crate) fn failed(task: Task) -> Self {
        let (code, message) = match task.first_error() {
            Some(detail) => (detail.error_code.clone(), detail.message.clone()),
            None => (None, None),
        };
        Self::TaskFailed {
            uri: task.uri.clone(),
            state: task.state.clone(),
            code,
            message,
            task: Box::new(task),
        }
    }

    /// The last task snapshot seen before the error, when there was one
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::TaskFailed { task, .. } => Some(task),
            Self::Timeout { last, .. } => Some(last),
            _ => None,
        }
    }
}
