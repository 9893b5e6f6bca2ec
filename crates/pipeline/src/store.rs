//! In-memory, index-ordered task collection for one run.
//!
//! Phases never mutate the store while remote calls are in flight. They
//! read their inputs, run the calls, and hand back a list of
//! [`Outcome`]s that the store applies in one go at the phase barrier.

use assetflow_core::error::CoreError;
use assetflow_core::task::{AssetTask, FailureKind, FileRef, Phase, TaskFailure, TaskStatus};
use assetflow_core::types::TaskIndex;
use assetflow_remote::RemoteError;

/// A state change for one task, produced by a phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Staged { upload_url: String, key: String },
    Uploaded,
    Running { task_id: String },
    Succeeded,
    Failed(TaskFailure),
}

impl Transition {
    /// Record a failed remote call made during `phase`.
    pub fn remote_failure(phase: Phase, err: &RemoteError) -> Self {
        let kind = if err.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Remote
        };
        let mut failure = TaskFailure::new(phase, kind, err.to_string());
        if let Some(status) = err.http_status() {
            failure = failure.with_http_status(status);
        }
        Self::Failed(failure)
    }
}

/// The result of one task's remote call within a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub index: TaskIndex,
    /// `None` when the call succeeded but the task stays where it is
    /// (a status poll that reports "still running").
    pub transition: Option<Transition>,
}

impl Outcome {
    pub fn new(index: TaskIndex, transition: Transition) -> Self {
        Self {
            index,
            transition: Some(transition),
        }
    }

    pub fn unchanged(index: TaskIndex) -> Self {
        Self {
            index,
            transition: None,
        }
    }
}

/// Counts of what a batch of outcomes did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub advanced: usize,
    pub failed: usize,
    pub unchanged: usize,
    /// Outcomes the store refused (illegal transition or unknown index).
    pub rejected: usize,
}

/// Ordered collection of [`AssetTask`]s, one per file of the batch.
#[derive(Debug, Clone)]
pub struct AssetTaskStore {
    tasks: Vec<AssetTask>,
}

impl AssetTaskStore {
    /// Create one `pending` task per file, indexed by batch position.
    ///
    /// An empty batch is a user error and creates nothing.
    pub fn new(files: Vec<FileRef>) -> Result<Self, CoreError> {
        if files.is_empty() {
            return Err(CoreError::Validation(
                "Please select files to upload.".to_string(),
            ));
        }

        let tasks = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| AssetTask::new(index, file))
            .collect();
        Ok(Self { tasks })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[AssetTask] {
        &self.tasks
    }

    pub fn get(&self, index: TaskIndex) -> Option<&AssetTask> {
        self.tasks.get(index)
    }

    /// Tasks currently in `status`, in index order.
    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &AssetTask> {
        self.tasks.iter().filter(move |t| t.status() == status)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.with_status(status).count()
    }

    /// True once every task has succeeded or failed.
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(AssetTask::is_terminal)
    }

    /// Owned copy of every task, in index order.
    pub fn snapshot(&self) -> Vec<AssetTask> {
        self.tasks.clone()
    }

    pub fn into_tasks(self) -> Vec<AssetTask> {
        self.tasks
    }

    /// Apply a phase's outcomes.
    ///
    /// Outcomes that would break a task's invariants are dropped and
    /// logged; the task keeps its current state.
    pub fn apply(&mut self, outcomes: Vec<Outcome>) -> ApplySummary {
        let mut summary = ApplySummary::default();

        for outcome in outcomes {
            let Some(transition) = outcome.transition else {
                summary.unchanged += 1;
                continue;
            };

            let Some(task) = self.tasks.get_mut(outcome.index) else {
                tracing::warn!(index = outcome.index, "Outcome for unknown task ignored");
                summary.rejected += 1;
                continue;
            };

            let failed = matches!(transition, Transition::Failed(_));
            let result = match transition {
                Transition::Staged { upload_url, key } => task.stage(upload_url, key),
                Transition::Uploaded => task.mark_uploaded(),
                Transition::Running { task_id } => task.mark_running(task_id),
                Transition::Succeeded => task.mark_succeeded(),
                Transition::Failed(failure) => task.fail(failure),
            };

            match result {
                Ok(()) if failed => summary.failed += 1,
                Ok(()) => summary.advanced += 1,
                Err(e) => {
                    tracing::warn!(index = outcome.index, error = %e, "Rejected task transition");
                    summary.rejected += 1;
                }
            }
        }

        summary
    }

    /// Fail every task still in `status` with a timeout.
    pub fn expire(&mut self, status: TaskStatus, phase: Phase, message: &str) -> usize {
        let outcomes: Vec<_> = self
            .with_status(status)
            .map(|t| {
                Outcome::new(
                    t.index(),
                    Transition::Failed(TaskFailure::new(phase, FailureKind::Timeout, message)),
                )
            })
            .collect();
        self.apply(outcomes).failed
    }
}
