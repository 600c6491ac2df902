//! Asynchronous task handling
//!
//! Mutating appliance calls answer with a task. This module models that task
//! and waits on it.
//!
//! - [`task`] - task snapshot and state classification
//! - [`poller`] - the bounded poll loop
//! - [`error`] - why a wait ended without success

pub mod error;
pub mod poller;
pub mod task;

pub use error::ActivityError;
pub use poller::{
    await_task, PollPolicy, ProgressSink, TaskProgress, TaskSource, TracingSink, DEFAULT_INTERVAL,
    DEFAULT_TIMEOUT,
};
pub use task::{AssociatedResource, Task, TaskErrorDetail, TaskPhase, TaskState};
