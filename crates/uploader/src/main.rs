use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod config;
mod files;

use cli::Cli;
use config::UploaderConfig;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetflow_uploader=info,assetflow_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = UploaderConfig::from_cli(&cli)?;
    tracing::info!(
        files = cli.files.len(),
        pipeline = %config.pipeline.pipeline_name,
        upstream = %config.remote.base_url,
        "Uploader starting",
    );

    let summary = app::run(&config, &cli.files).await?;

    for line in &summary.rejections {
        println!("{line}");
    }
    for notification in &summary.notifications {
        println!("{notification}");
    }

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
