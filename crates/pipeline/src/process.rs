//! Process phase: submit every uploaded asset to the processing pipeline.
//!
//! Tasks that failed earlier are never submitted.

use assetflow_core::task::{Phase, TaskStatus};
use assetflow_remote::PipelineRemote;

use crate::fanout;
use crate::store::{ApplySummary, AssetTaskStore, Outcome, Transition};

/// Submit every `uploaded` task to `pipeline` and record its task id.
pub async fn run(
    remote: &dyn PipelineRemote,
    store: &mut AssetTaskStore,
    pipeline: &str,
    max_in_flight: usize,
) -> ApplySummary {
    let uploaded: Vec<_> = store
        .with_status(TaskStatus::Uploaded)
        .filter_map(|t| t.key().map(|key| (t.index(), key.to_string())))
        .collect();
    let attempted = uploaded.len();

    let outcomes = fanout::bounded(uploaded, max_in_flight, |(index, key)| async move {
        match remote.submit_process(&key, pipeline).await {
            Ok(ticket) => {
                tracing::debug!(index, %key, task_id = %ticket.task_id, "Processing submitted");
                Outcome::new(
                    index,
                    Transition::Running {
                        task_id: ticket.task_id,
                    },
                )
            }
            Err(e) => {
                tracing::warn!(index, %key, error = %e, "Process submission failed");
                Outcome::new(index, Transition::remote_failure(Phase::Process, &e))
            }
        }
    })
    .await;

    let summary = store.apply(outcomes);
    tracing::info!(
        attempted,
        pipeline,
        running = summary.advanced,
        failed = summary.failed,
        "Process phase settled",
    );
    summary
}
