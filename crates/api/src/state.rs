use std::sync::Arc;

use assetflow_remote::PipelineApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Client for the upstream pipeline, with the API key attached.
    pub pipeline: Arc<PipelineApi>,
    pub config: Arc<ServerConfig>,
}
