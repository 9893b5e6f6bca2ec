//! Per-file user notifications derived from a finished run.

use std::fmt;

use assetflow_core::task::{AssetTask, TaskStatus};
use assetflow_core::types::TaskIndex;
use serde::Serialize;

/// Outcome message for one file of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Notification {
    Succeeded {
        index: TaskIndex,
        name: String,
        key: String,
    },
    Failed {
        index: TaskIndex,
        name: String,
        /// Absent when the file never got past the stage phase.
        key: Option<String>,
        error: String,
    },
}

impl Notification {
    /// Build the notification for a terminal task. Non-terminal tasks
    /// have nothing to report yet.
    pub fn for_task(task: &AssetTask) -> Option<Self> {
        let name = task.file().name().to_string();
        match task.status() {
            TaskStatus::Succeeded => Some(Self::Succeeded {
                index: task.index(),
                name,
                key: task.key().unwrap_or_default().to_string(),
            }),
            TaskStatus::Failed => Some(Self::Failed {
                index: task.index(),
                name,
                key: task.key().map(str::to_string),
                error: task
                    .error()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            _ => None,
        }
    }

    pub fn index(&self) -> TaskIndex {
        match self {
            Self::Succeeded { index, .. } | Self::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { name, key, .. } => {
                write!(f, "{name} with key {key} processed successfully!")
            }
            Self::Failed {
                name,
                key: Some(key),
                error,
                ..
            } => write!(f, "Error processing {name} with key {key}: {error}"),
            Self::Failed {
                name,
                key: None,
                error,
                ..
            } => write!(f, "Error processing {name}: {error}"),
        }
    }
}

/// Notifications for every terminal task, in index order.
pub fn notifications(tasks: &[AssetTask]) -> Vec<Notification> {
    let mut out: Vec<_> = tasks.iter().filter_map(Notification::for_task).collect();
    out.sort_by_key(Notification::index);
    out
}
