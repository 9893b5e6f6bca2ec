use crate::task::TaskStatus;
use crate::types::TaskIndex;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition for task {index}: {from} -> {to}")]
    InvalidTransition {
        index: TaskIndex,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Task {index}: {field} is already set")]
    AlreadyAssigned {
        index: TaskIndex,
        field: &'static str,
    },
}
