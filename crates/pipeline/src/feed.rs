//! Progress feed for pipeline runs, backed by a `tokio::sync::broadcast`
//! channel.
//!
//! A run publishes one [`BatchSnapshot`] at each phase barrier and one
//! per poll round. The last snapshot of a run has `complete == true` and
//! every task in it is terminal; exactly one such snapshot is published
//! per run.

use assetflow_core::task::{AssetTask, Phase, TaskStatus};
use assetflow_core::types::Timestamp;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::store::AssetTaskStore;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// BatchSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of every task of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub run_id: Uuid,
    /// Position of this snapshot within its run, starting at 1.
    pub sequence: u64,
    /// Phase whose barrier (or poll round) produced the snapshot.
    pub trigger: Phase,
    /// Poll round number; 0 for phase barriers and when no polling was
    /// needed.
    pub round: u32,
    /// Every task of the batch, in index order.
    pub tasks: Vec<AssetTask>,
    /// True only on the final snapshot of the run.
    pub complete: bool,
    pub taken_at: Timestamp,
}

impl BatchSnapshot {
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(AssetTask::is_terminal)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }
}

// ---------------------------------------------------------------------------
// SnapshotFeed
// ---------------------------------------------------------------------------

/// Fan-out feed of [`BatchSnapshot`]s.
///
/// Any number of subscribers independently receive every snapshot
/// published after they subscribed. A subscriber that falls more than
/// the channel capacity behind observes `RecvError::Lagged`.
#[derive(Clone)]
pub struct SnapshotFeed {
    sender: broadcast::Sender<BatchSnapshot>,
}

impl SnapshotFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchSnapshot> {
        self.sender.subscribe()
    }

    /// Start publishing for a new run.
    pub fn publisher(&self, run_id: Uuid) -> RunPublisher {
        RunPublisher {
            run_id,
            sequence: 0,
            completed: false,
            sender: self.sender.clone(),
        }
    }
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// RunPublisher
// ---------------------------------------------------------------------------

/// Publishes the snapshots of a single run.
pub struct RunPublisher {
    run_id: Uuid,
    sequence: u64,
    completed: bool,
    sender: broadcast::Sender<BatchSnapshot>,
}

impl RunPublisher {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Whether the final snapshot has been published.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Publish a barrier or poll-round snapshot.
    pub fn progress(&mut self, trigger: Phase, round: u32, store: &AssetTaskStore) {
        self.publish(trigger, round, store, false);
    }

    /// Publish the final snapshot. Later calls are ignored.
    pub fn complete(&mut self, trigger: Phase, round: u32, store: &AssetTaskStore) {
        if self.completed {
            tracing::warn!(run_id = %self.run_id, "Final snapshot already published");
            return;
        }
        self.completed = true;
        self.publish(trigger, round, store, true);
    }

    fn publish(&mut self, trigger: Phase, round: u32, store: &AssetTaskStore, complete: bool) {
        self.sequence += 1;
        let snapshot = BatchSnapshot {
            run_id: self.run_id,
            sequence: self.sequence,
            trigger,
            round,
            tasks: store.snapshot(),
            complete,
            taken_at: Utc::now(),
        };
        // A send error only means nobody is subscribed.
        let _ = self.sender.send(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
