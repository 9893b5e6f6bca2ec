pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the pipeline proxy route tree.
///
/// ```text
/// /pipeline/assets/stage      POST  allocate `count` upload slots
/// /pipeline/assets/process    POST  submit a staged asset for processing
/// /pipeline/assets/status     POST  processing status, as a JSON download
/// ```
pub fn pipeline_routes() -> Router<AppState> {
    Router::new().nest(
        "/pipeline/assets",
        Router::new()
            .route("/stage", post(handlers::assets::stage_assets))
            .route("/process", post(handlers::assets::process_asset))
            .route("/status", post(handlers::assets::asset_status)),
    )
}
