//! Stage phase: allocate one upload slot per pending task.
//!
//! The remote hands out one slot per call, so a batch of N files makes N
//! independent calls. A failed call fails only its own task.

use assetflow_core::task::{Phase, TaskStatus};
use assetflow_remote::PipelineRemote;

use crate::fanout;
use crate::store::{ApplySummary, AssetTaskStore, Outcome, Transition};

/// Request a slot for every `pending` task and bind the results.
pub async fn run(
    remote: &dyn PipelineRemote,
    store: &mut AssetTaskStore,
    max_in_flight: usize,
) -> ApplySummary {
    let pending: Vec<_> = store
        .with_status(TaskStatus::Pending)
        .map(|t| t.index())
        .collect();
    let attempted = pending.len();

    let outcomes = fanout::bounded(pending, max_in_flight, |index| async move {
        match remote.request_stage_slot().await {
            Ok(slot) => Outcome::new(
                index,
                Transition::Staged {
                    upload_url: slot.url,
                    key: slot.key,
                },
            ),
            Err(e) => {
                tracing::warn!(index, error = %e, "Stage slot request failed");
                Outcome::new(index, Transition::remote_failure(Phase::Stage, &e))
            }
        }
    })
    .await;

    let summary = store.apply(outcomes);
    tracing::info!(
        attempted,
        staged = summary.advanced,
        failed = summary.failed,
        "Stage phase settled",
    );
    summary
}
