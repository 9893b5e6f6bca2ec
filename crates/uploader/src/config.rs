use std::time::Duration;

use anyhow::ensure;
use assetflow_core::selection::SelectionLimits;
use assetflow_pipeline::{PipelineConfig, PollConfig};
use assetflow_remote::RemoteConfig;

use crate::cli::Cli;

/// Everything one uploader invocation needs, validated.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub remote: RemoteConfig,
    pub pipeline: PipelineConfig,
    pub limits: SelectionLimits,
}

impl UploaderConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        ensure!(!cli.base_url.trim().is_empty(), "BASE_URL must not be empty");
        ensure!(cli.max_in_flight >= 1, "MAX_IN_FLIGHT must be at least 1");
        ensure!(cli.poll_interval_ms > 0, "POLL_INTERVAL_MS must be positive");
        ensure!(
            cli.poll_max_interval_ms >= cli.poll_interval_ms,
            "POLL_MAX_INTERVAL_MS must not be below POLL_INTERVAL_MS"
        );
        ensure!(
            cli.poll_multiplier.is_finite() && cli.poll_multiplier >= 1.0,
            "POLL_MULTIPLIER must be a number of at least 1.0"
        );
        ensure!(cli.poll_max_rounds >= 1, "POLL_MAX_ROUNDS must be at least 1");
        ensure!(cli.request_timeout_secs > 0, "REQUEST_TIMEOUT_SECS must be positive");

        let mut remote = RemoteConfig::new(cli.base_url.trim())
            .with_request_timeout(Duration::from_secs(cli.request_timeout_secs));
        if let Some(key) = cli.api_key.as_deref().filter(|k| !k.is_empty()) {
            remote = remote.with_api_key(key);
        }

        let pipeline = PipelineConfig {
            pipeline_name: cli.pipeline_name.clone(),
            max_in_flight: cli.max_in_flight,
            poll: PollConfig {
                initial_interval: Duration::from_millis(cli.poll_interval_ms),
                max_interval: Duration::from_millis(cli.poll_max_interval_ms),
                multiplier: cli.poll_multiplier,
                max_rounds: cli.poll_max_rounds,
            },
        };

        let limits = SelectionLimits {
            max_file_size: cli.max_file_size,
            max_width: cli.max_width,
            max_height: cli.max_height,
        };

        Ok(Self {
            remote,
            pipeline,
            limits,
        })
    }
}
