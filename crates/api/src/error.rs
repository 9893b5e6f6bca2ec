use assetflow_remote::RemoteError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error": message, "code": code }`
/// JSON. Upstream errors keep the upstream status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failed call to the remote pipeline.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Remote(remote) => classify_remote_error(remote),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a remote failure onto the response the browser sees.
///
/// - The upstream answered with an error: same status, upstream message.
/// - The upstream answered 2xx with an unexpected body: 502.
/// - No response at all, or the request could not be built: 500 with a
///   sanitized message.
fn classify_remote_error(err: &RemoteError) -> (StatusCode, &'static str, String) {
    match err {
        RemoteError::Api { status, message } => {
            tracing::warn!(status, error = %message, "Upstream rejected request");
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, "UPSTREAM_ERROR", message.clone())
        }
        RemoteError::Malformed { .. } => {
            tracing::error!(error = %err, "Malformed upstream response");
            (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", err.to_string())
        }
        RemoteError::InvalidRequest(msg) => {
            tracing::error!(error = %msg, "Upstream request could not be built");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal Server Error".to_string(),
            )
        }
        RemoteError::Transport(msg) => {
            tracing::error!(error = %msg, "Upstream unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal Server Error".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn upstream_status_and_message_pass_through() {
        let (status, body) = render(AppError::Remote(RemoteError::Api {
            status: 429,
            message: "quota exceeded".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "quota exceeded");
    }

    #[tokio::test]
    async fn transport_failure_is_a_sanitized_500() {
        let (status, body) =
            render(AppError::Remote(RemoteError::Transport("tcp connect error: 10.0.0.3".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn unbuildable_request_is_a_sanitized_500() {
        let (status, body) =
            render(AppError::Remote(RemoteError::InvalidRequest("relative URL without a base".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_gateway() {
        let (status, body) = render(AppError::Remote(RemoteError::Malformed {
            status: 200,
            message: "missing field `url`".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "BAD_GATEWAY");
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let (status, body) = render(AppError::BadRequest("count must be between 1 and 100".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "count must be between 1 and 100");
    }
}
