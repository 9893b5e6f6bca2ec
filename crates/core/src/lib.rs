//! Domain model shared by every assetflow crate.
//!
//! - [`task`]: per-file task records, the status state machine, and the
//!   failure taxonomy recorded on failed tasks.
//! - [`selection`]: pre-flight file selection (type, size, and
//!   dimension limits) run before a batch is handed to the pipeline.
//! - [`error`]: [`CoreError`](error::CoreError).

pub mod error;
pub mod selection;
pub mod task;
pub mod types;
