//! Tunables for a pipeline run.

use std::time::Duration;

/// Pipeline that uploaded assets are submitted to unless configured otherwise.
pub const DEFAULT_PIPELINE_NAME: &str = "dragonfly-img-basic";

/// Default cap on concurrent remote calls within one phase.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Settings for one orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Processing pipeline every asset of the batch is submitted to.
    pub pipeline_name: String,
    /// Upper bound on concurrent remote calls within a phase.
    pub max_in_flight: usize,
    pub poll: PollConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            poll: PollConfig::default(),
        }
    }
}

/// Status polling schedule.
///
/// The first round runs `initial_interval` after the process phase
/// settles. Each following wait is the previous one times `multiplier`,
/// capped at `max_interval`. After `max_rounds` rounds, tasks that are
/// still running are failed with a timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub max_rounds: u32,
}

impl PollConfig {
    /// Poll on a fixed interval, at most `max_rounds` times.
    pub fn fixed(interval: Duration, max_rounds: u32) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            max_rounds,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(2000),
            max_interval: Duration::from_secs(30),
            multiplier: 1.5,
            max_rounds: 120,
        }
    }
}
