//! Upload phase: `PUT` every staged file to its upload URL.

use assetflow_core::task::{Phase, TaskStatus};
use assetflow_remote::PipelineRemote;

use crate::fanout;
use crate::store::{ApplySummary, AssetTaskStore, Outcome, Transition};

/// Upload the bytes of every `staged` task.
pub async fn run(
    remote: &dyn PipelineRemote,
    store: &mut AssetTaskStore,
    max_in_flight: usize,
) -> ApplySummary {
    let staged: Vec<_> = store
        .with_status(TaskStatus::Staged)
        .filter_map(|t| {
            t.upload_url()
                .map(|url| (t.index(), url.to_string(), t.file().clone()))
        })
        .collect();
    let attempted = staged.len();

    let outcomes = fanout::bounded(staged, max_in_flight, |(index, url, file)| async move {
        match remote.put_bytes(&url, &file).await {
            Ok(()) => {
                tracing::debug!(index, file = file.name(), bytes = file.len(), "File uploaded");
                Outcome::new(index, Transition::Uploaded)
            }
            Err(e) => {
                tracing::warn!(index, file = file.name(), error = %e, "Upload failed");
                Outcome::new(index, Transition::remote_failure(Phase::Upload, &e))
            }
        }
    })
    .await;

    let summary = store.apply(outcomes);
    tracing::info!(
        attempted,
        uploaded = summary.advanced,
        failed = summary.failed,
        "Upload phase settled",
    );
    summary
}
