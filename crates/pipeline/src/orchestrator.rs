//! Drives a batch of files through stage, upload, process and polling.

use std::sync::Arc;

use assetflow_core::error::CoreError;
use assetflow_core::task::{AssetTask, FileRef, Phase, TaskStatus};
use assetflow_remote::PipelineRemote;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::feed::{BatchSnapshot, SnapshotFeed};
use crate::report::{self, Notification};
use crate::store::AssetTaskStore;
use crate::{poller, process, stage, upload};

/// Final state of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Every task of the batch in index order. All of them are terminal.
    pub tasks: Vec<AssetTask>,
    pub poll_rounds: u32,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn notifications(&self) -> Vec<Notification> {
        report::notifications(&self.tasks)
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }
}

/// Runs batches against one remote.
///
/// Each [`run`](Self::run) owns its own task store, so concurrent runs on
/// the same orchestrator never share state. Snapshots of every run go to
/// the same feed and carry their run id.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    remote: Arc<dyn PipelineRemote>,
    config: PipelineConfig,
    feed: SnapshotFeed,
}

impl PipelineOrchestrator {
    pub fn new(remote: Arc<dyn PipelineRemote>, config: PipelineConfig) -> Self {
        Self {
            remote,
            config,
            feed: SnapshotFeed::default(),
        }
    }

    /// Publish snapshots on an existing feed instead of a private one.
    pub fn with_feed(mut self, feed: SnapshotFeed) -> Self {
        self.feed = feed;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchSnapshot> {
        self.feed.subscribe()
    }

    /// Take `files` through the whole pipeline.
    ///
    /// An empty batch is rejected before any remote call is made. Per-file
    /// failures never abort the run; they end up in the report.
    pub async fn run(&self, files: Vec<FileRef>) -> Result<RunReport, CoreError> {
        let store = AssetTaskStore::new(files)?;
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!("pipeline_run", %run_id, files = store.len());

        Ok(self.drive(run_id, store).instrument(span).await)
    }

    async fn drive(&self, run_id: Uuid, mut store: AssetTaskStore) -> RunReport {
        let remote = self.remote.as_ref();
        let limit = self.config.max_in_flight;
        let mut publisher = self.feed.publisher(run_id);

        tracing::info!(pipeline = %self.config.pipeline_name, max_in_flight = limit, "Run started");

        stage::run(remote, &mut store, limit).await;
        publisher.progress(Phase::Stage, 0, &store);

        upload::run(remote, &mut store, limit).await;
        publisher.progress(Phase::Upload, 0, &store);

        process::run(remote, &mut store, &self.config.pipeline_name, limit).await;
        publisher.progress(Phase::Process, 0, &store);

        let polled = poller::run(remote, &mut store, &self.config.poll, limit, &mut publisher).await;

        let report = RunReport {
            run_id,
            tasks: store.into_tasks(),
            poll_rounds: polled.rounds,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            poll_rounds = report.poll_rounds,
            "Run finished",
        );
        report
    }
}
