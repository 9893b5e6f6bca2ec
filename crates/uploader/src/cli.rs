use std::path::PathBuf;

use clap::Parser;

/// Upload image files to the remote asset pipeline and wait for processing.
///
/// Every option can also be set through the environment variable shown
/// next to it; a `.env` file in the working directory is loaded first.
#[derive(Debug, Parser)]
#[command(name = "assetflow-uploader", version)]
#[command(about = "Stage, upload and process image files through the remote asset pipeline", long_about = None)]
pub struct Cli {
    /// Image files to upload, processed in the order given
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Base URL of the remote pipeline
    #[arg(long, env = "BASE_URL")]
    pub base_url: String,

    /// Value sent as the Authorization header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Processing pipeline to submit every file to
    #[arg(long = "pipeline", env = "PIPELINE_NAME", default_value = assetflow_pipeline::config::DEFAULT_PIPELINE_NAME)]
    pub pipeline_name: String,

    /// Upper bound on concurrent remote calls per phase
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = assetflow_pipeline::config::DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,

    /// Wait before the first status poll, in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Longest wait between status polls, in milliseconds
    #[arg(long, env = "POLL_MAX_INTERVAL_MS", default_value_t = 30_000)]
    pub poll_max_interval_ms: u64,

    /// Growth factor of the wait between status polls (1.0 polls at a fixed interval)
    #[arg(long, env = "POLL_MULTIPLIER", default_value_t = 1.5)]
    pub poll_multiplier: f64,

    /// Status poll rounds before still-running files are failed
    #[arg(long, env = "POLL_MAX_ROUNDS", default_value_t = 120)]
    pub poll_max_rounds: u32,

    /// Timeout of each remote request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Largest accepted file, in bytes
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = assetflow_core::selection::DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Widest accepted image, in pixels
    #[arg(long, env = "MAX_WIDTH", default_value_t = assetflow_core::selection::DEFAULT_MAX_WIDTH)]
    pub max_width: u32,

    /// Tallest accepted image, in pixels
    #[arg(long, env = "MAX_HEIGHT", default_value_t = assetflow_core::selection::DEFAULT_MAX_HEIGHT)]
    pub max_height: u32,
}
