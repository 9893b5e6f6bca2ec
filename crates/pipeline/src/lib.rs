//! Batch orchestration for the remote asset pipeline.
//!
//! A run takes an ordered batch of files through four phases, each a
//! bounded concurrent fan-out followed by a barrier:
//!
//! 1. [`stage`]: allocate one upload slot per file.
//! 2. [`upload`]: `PUT` each staged file to its slot.
//! 3. [`process`]: submit each uploaded file to the processing pipeline.
//! 4. [`poller`]: poll running tasks until every task is terminal.
//!
//! The [`AssetTaskStore`](store::AssetTaskStore) is owned by the run and
//! only mutated at barriers. Progress is published as
//! [`BatchSnapshot`](feed::BatchSnapshot)s on a broadcast
//! [`SnapshotFeed`](feed::SnapshotFeed).

pub mod backoff;
pub mod config;
pub mod fanout;
pub mod feed;
pub mod orchestrator;
pub mod poller;
pub mod process;
pub mod report;
pub mod stage;
pub mod store;
pub mod upload;

pub use config::{PipelineConfig, PollConfig};
pub use feed::{BatchSnapshot, SnapshotFeed};
pub use orchestrator::{PipelineOrchestrator, RunReport};
pub use report::Notification;
