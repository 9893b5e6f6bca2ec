//! Client library for the remote asset pipeline.
//!
//! The remote exposes four operations: allocate an upload slot (stage),
//! upload bytes to that slot, submit the staged asset to a named
//! processing pipeline, and query the status of a processing task.
//!
//! [`PipelineRemote`] is the seam the orchestrator depends on;
//! [`PipelineApi`](api::PipelineApi) is the HTTP implementation.

pub mod api;
pub mod error;
pub mod messages;

use assetflow_core::task::FileRef;
use async_trait::async_trait;

pub use api::{PipelineApi, RemoteConfig};
pub use error::RemoteError;
pub use messages::{ProcessTicket, RemoteStatus, StageSlot, StatusReport};

/// The four remote operations a pipeline run needs.
///
/// Implementations perform no retries. Every failure is reported as a
/// [`RemoteError`] that tells a remote-reported error apart from a
/// transport failure.
#[async_trait]
pub trait PipelineRemote: Send + Sync {
    /// Allocate one upload slot.
    async fn request_stage_slot(&self) -> Result<StageSlot, RemoteError>;

    /// Upload the file's bytes to a staged upload URL.
    async fn put_bytes(&self, url: &str, file: &FileRef) -> Result<(), RemoteError>;

    /// Submit a staged and uploaded asset to the named pipeline.
    async fn submit_process(&self, key: &str, pipeline: &str) -> Result<ProcessTicket, RemoteError>;

    /// Query the current status of a processing task.
    async fn fetch_status(&self, task_id: &str) -> Result<StatusReport, RemoteError>;
}
