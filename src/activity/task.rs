//! Task model
//!
//! A task is the appliance's record of an asynchronous operation. The client
//! only ever holds snapshots of it and refreshes them by re-fetching `uri`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Snapshot of an appliance task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Self-locator, e.g. `/rest/tasks/5A3C...`
    #[serde(default)]
    pub uri: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "taskState", default)]
    pub state: TaskState,
    /// Human readable progress line reported by the appliance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_resource: Option<AssociatedResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_errors: Vec<TaskErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Everything else the appliance sent, kept so the body round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resource a task acts upon
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_type: Option<String>,
}

/// One entry of a failed task's `taskErrors`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_actions: Vec<String>,
}

/// Where a task state sits in the task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    /// Still running server-side
    Pending,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
}

/// Value of a task's `taskState`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    New,
    Pending,
    Running,
    Starting,
    Stopping,
    Suspended,
    Interrupted,
    Completed,
    Warning,
    Error,
    Terminated,
    Killed,
    Other(String),
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s {
            "New" => Self::New,
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Starting" => Self::Starting,
            "Stopping" => Self::Stopping,
            "Suspended" => Self::Suspended,
            "Interrupted" => Self::Interrupted,
            "Completed" => Self::Completed,
            "Warning" => Self::Warning,
            "Error" => Self::Error,
            "Terminated" => Self::Terminated,
            "Killed" => Self::Killed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Parsing never fails; unrecognized states become [`TaskState::Other`]
impl FromStr for TaskState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "New",
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Starting => "Starting",
            Self::Stopping => "Stopping",
            Self::Suspended => "Suspended",
            Self::Interrupted => "Interrupted",
            Self::Completed => "Completed",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Terminated => "Terminated",
            Self::Killed => "Killed",
            Self::Other(s) => s,
        }
    }

    /// Classify this state. Unrecognized states are treated as still running.
    pub fn phase(&self) -> TaskPhase {
        match self {
            Self::Completed | Self::Warning => TaskPhase::Succeeded,
            Self::Error | Self::Terminated | Self::Killed => TaskPhase::Failed,
            _ => TaskPhase::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() != TaskPhase::Pending
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

impl Task {
    /// Parse a task out of a JSON body
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// The task as the appliance would send it
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether a JSON body looks like a task (`type` is `Task`, `TaskResourceV2`, ...)
    pub fn is_task_body(value: &Value) -> bool {
        value
            .get("type")
            .and_then(|v| v.as_str())
            .map(|t| t.starts_with("Task"))
            .unwrap_or(false)
    }

    /// URI of the resource this task created or modified, if reported
    pub fn resource_uri(&self) -> Option<&str> {
        self.associated_resource
            .as_ref()
            .and_then(|r| r.resource_uri.as_deref())
            .filter(|uri| !uri.is_empty())
    }

    /// First reported error, if any
    pub fn first_error(&self) -> Option<&TaskErrorDetail> {
        self.task_errors.first()
    }
}
