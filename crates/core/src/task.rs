//! Per-file task records for a pipeline run.
//!
//! An [`AssetTask`] follows a strictly forward state machine:
//!
//! ```text
//! pending -> staged -> uploaded -> running -> succeeded
//!    \          \          \          \
//!     +----------+----------+----------+----> failed
//! ```
//!
//! Every transition goes through a method on [`AssetTask`] that rejects
//! backward moves and repeated assignment of the stage slot or remote
//! task id, so callers cannot corrupt a record by applying an outcome
//! twice.

use std::fmt;

use bytes::Bytes;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::TaskIndex;

// ---------------------------------------------------------------------------
// FileRef
// ---------------------------------------------------------------------------

/// Handle to a file's bytes plus its declared content type.
///
/// Cloning is cheap: the bytes are shared, and so is the upload body
/// handed out by [`body`](Self::body). The pipeline never inspects the
/// bytes, it only forwards them to the upload destination.
#[derive(Clone)]
pub struct FileRef {
    name: String,
    content_type: String,
    bytes: Bytes,
}

impl FileRef {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Display name (usually the file name without directories).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type sent as `Content-Type` on upload.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes as a shared upload body. No copy is made.
    pub fn body(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for FileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileRef", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("content_type", &self.content_type)?;
        state.serialize_field("size", &self.bytes.len())?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Record created, stage slot not yet assigned.
    Pending,
    /// Upload URL and key assigned.
    Staged,
    /// Bytes accepted by the upload destination.
    Uploaded,
    /// Submitted for processing; being polled.
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Position in the lifecycle order. Both terminal states share the
    /// highest rank.
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Staged => 1,
            Self::Uploaded => 2,
            Self::Running => 3,
            Self::Succeeded | Self::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `self -> next` is a legal single step.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Succeeded | Self::Failed, _) => false,
            (_, Self::Failed) => true,
            (Self::Pending, Self::Staged)
            | (Self::Staged, Self::Uploaded)
            | (Self::Uploaded, Self::Running)
            | (Self::Running, Self::Succeeded) => true,
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Staged => "staged",
            Self::Uploaded => "uploaded",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// The pipeline phase a task was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Stage,
    Upload,
    Process,
    Poll,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Upload => "upload",
            Self::Process => "process",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote answered, and the answer was an error (HTTP error
    /// status, unusable body, or a failed status report).
    Remote,
    /// No response was received (connect, DNS, TLS, timeout).
    Transport,
    /// Still running when the poll round limit was reached.
    Timeout,
}

/// Failure recorded on a task in the `failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub phase: Phase,
    pub kind: FailureKind,
    /// HTTP status of the remote response, when there was one.
    pub http_status: Option<u16>,
    /// Human-readable cause, shown to the user as-is.
    pub message: String,
}

impl TaskFailure {
    pub fn new(phase: Phase, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            phase,
            kind,
            http_status: None,
            message: message.into(),
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// AssetTask
// ---------------------------------------------------------------------------

/// Orchestration state for one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct AssetTask {
    index: TaskIndex,
    file: FileRef,
    upload_url: Option<String>,
    key: Option<String>,
    task_id: Option<String>,
    status: TaskStatus,
    error: Option<TaskFailure>,
}

impl AssetTask {
    /// Create a `pending` task for the file at `index`.
    pub fn new(index: TaskIndex, file: FileRef) -> Self {
        Self {
            index,
            file,
            upload_url: None,
            key: None,
            task_id: None,
            status: TaskStatus::Pending,
            error: None,
        }
    }

    pub fn index(&self) -> TaskIndex {
        self.index
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn upload_url(&self) -> Option<&str> {
        self.upload_url.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn error(&self) -> Option<&TaskFailure> {
        self.error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Bind the stage slot and move to `staged`.
    pub fn stage(&mut self, upload_url: String, key: String) -> Result<(), CoreError> {
        if self.upload_url.is_some() || self.key.is_some() {
            return Err(CoreError::AlreadyAssigned {
                index: self.index,
                field: "stage slot",
            });
        }
        self.advance(TaskStatus::Staged)?;
        self.upload_url = Some(upload_url);
        self.key = Some(key);
        Ok(())
    }

    pub fn mark_uploaded(&mut self) -> Result<(), CoreError> {
        self.advance(TaskStatus::Uploaded)
    }

    /// Record the remote task id and move to `running`.
    pub fn mark_running(&mut self, task_id: String) -> Result<(), CoreError> {
        if self.task_id.is_some() {
            return Err(CoreError::AlreadyAssigned {
                index: self.index,
                field: "task id",
            });
        }
        self.advance(TaskStatus::Running)?;
        self.task_id = Some(task_id);
        Ok(())
    }

    pub fn mark_succeeded(&mut self) -> Result<(), CoreError> {
        self.advance(TaskStatus::Succeeded)
    }

    pub fn fail(&mut self, failure: TaskFailure) -> Result<(), CoreError> {
        self.advance(TaskStatus::Failed)?;
        self.error = Some(failure);
        Ok(())
    }

    fn advance(&mut self, next: TaskStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                index: self.index,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn task() -> AssetTask {
        AssetTask::new(0, FileRef::new("a.png", "image/png", vec![1, 2, 3]))
    }

    fn failure() -> TaskFailure {
        TaskFailure::new(Phase::Upload, FailureKind::Remote, "boom")
    }

    #[test]
    fn upload_body_shares_the_file_bytes() {
        let file = FileRef::new("a.png", "image/png", vec![1, 2, 3]);
        let copy = file.clone();

        let body = copy.body();
        assert_eq!(&body[..], &[1, 2, 3]);
        assert_eq!(body.as_ptr(), file.bytes().as_ptr());
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn happy_path_walks_every_state() {
        let mut t = task();
        t.stage("https://upload/1".into(), "k1".into()).unwrap();
        assert_eq!(t.status(), TaskStatus::Staged);
        t.mark_uploaded().unwrap();
        t.mark_running("t-1".into()).unwrap();
        t.mark_succeeded().unwrap();

        assert_eq!(t.status(), TaskStatus::Succeeded);
        assert_eq!(t.key(), Some("k1"));
        assert_eq!(t.upload_url(), Some("https://upload/1"));
        assert_eq!(t.task_id(), Some("t-1"));
        assert!(t.error().is_none());
    }

    #[test]
    fn failed_is_reachable_from_every_non_terminal_state() {
        for steps in 0..4 {
            let mut t = task();
            if steps > 0 {
                t.stage("u".into(), "k".into()).unwrap();
            }
            if steps > 1 {
                t.mark_uploaded().unwrap();
            }
            if steps > 2 {
                t.mark_running("id".into()).unwrap();
            }
            t.fail(failure()).unwrap();
            assert_eq!(t.status(), TaskStatus::Failed);
            assert_eq!(t.error().map(|e| e.message.as_str()), Some("boom"));
        }
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut t = task();
        t.fail(failure()).unwrap();
        assert_matches!(
            t.fail(failure()),
            Err(CoreError::InvalidTransition {
                from: TaskStatus::Failed,
                to: TaskStatus::Failed,
                ..
            })
        );
        assert_matches!(t.mark_uploaded(), Err(CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        let mut t = task();
        assert_matches!(
            t.mark_uploaded(),
            Err(CoreError::InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Uploaded,
                ..
            })
        );
        assert_eq!(t.status(), TaskStatus::Pending);
    }

    #[test]
    fn stage_slot_is_assigned_once() {
        let mut t = task();
        t.stage("u1".into(), "k1".into()).unwrap();
        assert_matches!(
            t.stage("u2".into(), "k2".into()),
            Err(CoreError::AlreadyAssigned { field: "stage slot", .. })
        );
        assert_eq!(t.key(), Some("k1"));
    }

    #[test]
    fn task_id_requires_uploaded() {
        let mut t = task();
        t.stage("u".into(), "k".into()).unwrap();
        assert!(t.mark_running("id".into()).is_err());
        assert!(t.task_id().is_none());
    }

    #[test]
    fn rank_orders_lifecycle() {
        assert!(TaskStatus::Pending.rank() < TaskStatus::Staged.rank());
        assert!(TaskStatus::Staged.rank() < TaskStatus::Uploaded.rank());
        assert!(TaskStatus::Uploaded.rank() < TaskStatus::Running.rank());
        assert_eq!(TaskStatus::Succeeded.rank(), TaskStatus::Failed.rank());
    }

    #[test]
    fn serializes_without_file_bytes() {
        let json = serde_json::to_value(task()).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["file"]["name"], "a.png");
        assert_eq!(json["file"]["size"], 3);
        assert!(json["file"].get("bytes").is_none());
    }

    #[test]
    fn failure_display_is_the_message() {
        let f = TaskFailure::new(Phase::Stage, FailureKind::Remote, "quota exceeded")
            .with_http_status(429);
        assert_eq!(f.to_string(), "quota exceeded");
        assert_eq!(f.http_status, Some(429));
    }
}
