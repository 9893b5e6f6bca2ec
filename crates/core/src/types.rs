/// Position of a file within its submitted batch.
pub type TaskIndex = usize;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
