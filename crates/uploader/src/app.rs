//! One uploader run: read, select, orchestrate, report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use assetflow_core::selection::select_files;
use assetflow_core::task::TaskStatus;
use assetflow_pipeline::{BatchSnapshot, Notification, PipelineOrchestrator};
use assetflow_remote::PipelineApi;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::config::UploaderConfig;
use crate::files::read_candidates;

/// What the caller needs to print and to pick an exit status.
#[derive(Debug)]
pub struct RunSummary {
    /// One line per file that was rejected before upload.
    pub rejections: Vec<String>,
    /// One notification per uploaded file, in batch order.
    pub notifications: Vec<Notification>,
}

impl RunSummary {
    /// True when every file was accepted and processed successfully.
    pub fn all_succeeded(&self) -> bool {
        self.rejections.is_empty() && self.notifications.iter().all(Notification::is_success)
    }
}

/// Upload `paths` with `config`.
///
/// Errors only when nothing could be attempted: the client could not be
/// built or no file survived selection.
pub async fn run(config: &UploaderConfig, paths: &[PathBuf]) -> anyhow::Result<RunSummary> {
    let (candidates, mut rejected) = read_candidates(paths).await;
    let selection = select_files(candidates, &config.limits);
    rejected.extend(selection.rejected);

    let rejections: Vec<String> = rejected
        .iter()
        .map(|r| format!("Skipping {}: {}", r.name, r.reason))
        .collect();
    for line in &rejections {
        tracing::warn!("{line}");
    }
    tracing::info!(
        accepted = selection.accepted.len(),
        rejected = rejected.len(),
        "File selection complete",
    );

    let api = PipelineApi::new(config.remote.clone()).context("Failed to build HTTP client")?;
    let orchestrator = PipelineOrchestrator::new(Arc::new(api), config.pipeline.clone());

    let progress = tokio::spawn(log_progress(orchestrator.subscribe()));
    let result = orchestrator.run(selection.accepted).await;
    if result.is_ok() {
        // Stops by itself after the final snapshot.
        let _ = progress.await;
    } else {
        progress.abort();
    }

    let report = result.context("Nothing to upload")?;
    Ok(RunSummary {
        rejections,
        notifications: report.notifications(),
    })
}

/// Log every snapshot until the final one.
async fn log_progress(mut rx: broadcast::Receiver<BatchSnapshot>) {
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                log_snapshot(&snapshot);
                if snapshot.complete {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Progress logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_snapshot(snapshot: &BatchSnapshot) {
    tracing::info!(
        run_id = %snapshot.run_id,
        after = %snapshot.trigger,
        round = snapshot.round,
        pending = snapshot.count(TaskStatus::Pending),
        staged = snapshot.count(TaskStatus::Staged),
        uploaded = snapshot.count(TaskStatus::Uploaded),
        running = snapshot.count(TaskStatus::Running),
        succeeded = snapshot.count(TaskStatus::Succeeded),
        failed = snapshot.count(TaskStatus::Failed),
        complete = snapshot.complete,
        "Progress",
    );
}
