//! Status polling: query every running task until all tasks are terminal.
//!
//! Rounds never overlap: a round's calls all settle before the next wait
//! starts. The wait grows per [`PollConfig`] and polling stops after
//! `max_rounds`, failing whatever is still running with a timeout.

use assetflow_core::task::{FailureKind, Phase, TaskFailure, TaskStatus};
use assetflow_remote::{PipelineRemote, RemoteStatus};

use crate::backoff::next_delay;
use crate::config::PollConfig;
use crate::fanout;
use crate::feed::RunPublisher;
use crate::store::{ApplySummary, AssetTaskStore, Outcome, Transition};

/// What a polling loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Rounds performed. Zero when nothing was running to begin with.
    pub rounds: u32,
    /// Tasks failed because they were still running after the last round.
    pub timed_out: usize,
}

/// Poll until every task is terminal, publishing one snapshot per round
/// and exactly one final snapshot.
pub async fn run(
    remote: &dyn PipelineRemote,
    store: &mut AssetTaskStore,
    config: &PollConfig,
    max_in_flight: usize,
    publisher: &mut RunPublisher,
) -> PollSummary {
    let mut summary = PollSummary::default();

    if store.all_terminal() {
        tracing::info!("Nothing to poll, every task is already terminal");
        publisher.complete(Phase::Poll, 0, store);
        return summary;
    }

    let mut delay = config.initial_interval;
    loop {
        tokio::time::sleep(delay).await;
        summary.rounds += 1;

        let round = poll_round(remote, store, max_in_flight).await;
        let mut all_done = store.all_terminal();
        tracing::debug!(
            round = summary.rounds,
            delay_ms = delay.as_millis() as u64,
            succeeded = round.advanced,
            failed = round.failed,
            still_running = round.unchanged,
            all_done,
            "Poll round settled",
        );

        if !all_done && summary.rounds >= config.max_rounds {
            let message = format!(
                "no terminal status after {} poll rounds",
                summary.rounds
            );
            summary.timed_out = store.expire(TaskStatus::Running, Phase::Poll, &message);
            tracing::warn!(
                rounds = summary.rounds,
                timed_out = summary.timed_out,
                "Poll round limit reached",
            );
            all_done = true;
        }

        if all_done {
            publisher.complete(Phase::Poll, summary.rounds, store);
            break;
        }

        publisher.progress(Phase::Poll, summary.rounds, store);
        delay = next_delay(delay, config);
    }

    tracing::info!(
        rounds = summary.rounds,
        timed_out = summary.timed_out,
        "Polling finished",
    );
    summary
}

/// Query every `running` task once and apply the results.
pub async fn poll_round(
    remote: &dyn PipelineRemote,
    store: &mut AssetTaskStore,
    max_in_flight: usize,
) -> ApplySummary {
    let running: Vec<_> = store
        .with_status(TaskStatus::Running)
        .filter_map(|t| t.task_id().map(|id| (t.index(), id.to_string())))
        .collect();

    let outcomes = fanout::bounded(running, max_in_flight, |(index, task_id)| async move {
        match remote.fetch_status(&task_id).await {
            Ok(report) => match report.outcome() {
                RemoteStatus::Succeeded => {
                    tracing::info!(index, %task_id, "Processing succeeded");
                    Outcome::new(index, Transition::Succeeded)
                }
                RemoteStatus::Failed => {
                    let message = match report.title.as_deref() {
                        Some(title) => format!("processing {}: {title}", report.status),
                        None => format!("processing {}", report.status),
                    };
                    tracing::warn!(index, %task_id, %message, "Remote reported failure");
                    Outcome::new(
                        index,
                        Transition::Failed(TaskFailure::new(Phase::Poll, FailureKind::Remote, message)),
                    )
                }
                RemoteStatus::InProgress => Outcome::unchanged(index),
            },
            Err(e) => {
                tracing::warn!(index, %task_id, error = %e, "Status poll failed");
                Outcome::new(index, Transition::remote_failure(Phase::Poll, &e))
            }
        }
    })
    .await;

    store.apply(outcomes)
}
