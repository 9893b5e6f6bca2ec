//! Handlers for the pipeline asset proxy.
//!
//! Each endpoint forwards to the same path on the upstream pipeline with
//! the server-held API key attached, so browsers never see the key.
//! Request bodies may be JSON or urlencoded forms.

use assetflow_remote::{ProcessTicket, StageSlot, StatusReport};
use axum::extract::State;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::JsonOrForm;
use crate::state::AppState;

/// Largest number of upload slots a single stage request may ask for.
pub const MAX_STAGE_COUNT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StageResponse {
    pub responses: Vec<StageSlot>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub key: String,
    pub pipeline: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub task_id: String,
}

/// POST /pipeline/assets/stage
///
/// Allocate `count` upload slots. The upstream calls run concurrently and
/// the request fails as a whole if any of them fails.
pub async fn stage_assets(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<StageRequest>,
) -> AppResult<Json<StageResponse>> {
    if !(1..=MAX_STAGE_COUNT).contains(&input.count) {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {MAX_STAGE_COUNT}"
        )));
    }

    let responses = state.pipeline.request_stage_slots(input.count).await?;
    tracing::info!(count = responses.len(), "Staged upload slots");

    Ok(Json(StageResponse { responses }))
}

/// POST /pipeline/assets/process
///
/// Submit a staged asset to a processing pipeline and return the upstream
/// ticket as-is.
pub async fn process_asset(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<ProcessRequest>,
) -> AppResult<Json<ProcessTicket>> {
    let ticket = state
        .pipeline
        .submit_process(&input.key, &input.pipeline)
        .await?;
    tracing::info!(key = %input.key, pipeline = %input.pipeline, task_id = %ticket.task_id, "Submitted asset");

    Ok(Json(ticket))
}

/// POST /pipeline/assets/status
///
/// Return the upstream status report as a `<title>.json` download.
pub async fn asset_status(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<StatusRequest>,
) -> AppResult<Response> {
    let report = state.pipeline.fetch_status(&input.task_id).await?;
    tracing::debug!(task_id = %input.task_id, status = %report.status, "Fetched status");

    let disposition = content_disposition(report.title.as_deref());
    Ok(([(CONTENT_DISPOSITION, disposition)], Json::<StatusReport>(report)).into_response())
}

/// `attachment; filename=<title>.json`, with `status` standing in for a
/// missing or empty title.
fn content_disposition(title: Option<&str>) -> HeaderValue {
    let stem: String = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("status")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename={stem}.json"))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=status.json"))
}
