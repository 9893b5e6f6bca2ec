//! HTTP client for the remote asset pipeline.
//!
//! Wraps the stage, process and status endpoints plus the direct upload
//! `PUT` using [`reqwest`]. Every request carries the configured timeout,
//! so a hung remote surfaces as a transport failure instead of stalling
//! its task forever.

use std::time::Duration;

use assetflow_core::task::FileRef;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::error::{error_message, RemoteError};
use crate::messages::{ProcessTicket, StageSlot, StatusReport};
use crate::PipelineRemote;

/// Default timeout for a single remote request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the remote pipeline.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base HTTP URL, e.g. `https://api.example.com`. Endpoint paths are
    /// appended to it.
    pub base_url: String,
    /// Sent verbatim as the `Authorization` header on stage, process and
    /// status calls. Never sent to upload URLs.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// HTTP client for one remote pipeline deployment.
#[derive(Clone)]
pub struct PipelineApi {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl PipelineApi {
    /// Build a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    /// The client's own timeout applies; `config.request_timeout` is
    /// still set on every request.
    pub fn with_client(client: reqwest::Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Allocate one upload slot.
    ///
    /// Sends `POST /pipeline/assets/stage` with an empty JSON object. The
    /// remote hands out exactly one slot per call.
    pub async fn request_stage_slot(&self) -> Result<StageSlot, RemoteError> {
        let response = self
            .authorized(self.client.post(self.endpoint("stage")))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Allocate `count` upload slots with `count` concurrent calls.
    ///
    /// All-or-nothing: the first failure is returned and the successful
    /// slots are discarded.
    pub async fn request_stage_slots(&self, count: usize) -> Result<Vec<StageSlot>, RemoteError> {
        let requests = (0..count).map(|_| self.request_stage_slot());
        let slots = futures::future::try_join_all(requests).await?;
        tracing::debug!(count, "Stage slots allocated");
        Ok(slots)
    }

    /// Upload file bytes to a pre-signed URL.
    ///
    /// Sends `PUT {url}` with the file's declared content type. The API
    /// key is not attached: the URL itself carries the authorization.
    pub async fn put_bytes(&self, url: &str, file: &FileRef) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(url)
            .timeout(self.config.request_timeout)
            .header(CONTENT_TYPE, file.content_type())
            .body(file.body())
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Submit a staged asset for processing.
    ///
    /// Sends `POST /pipeline/assets/process` as a form
    /// (`key=…&pipeline=…`) and returns the remote task id.
    pub async fn submit_process(&self, key: &str, pipeline: &str) -> Result<ProcessTicket, RemoteError> {
        let response = self
            .authorized(self.client.post(self.endpoint("process")))
            .form(&[("key", key), ("pipeline", pipeline)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Query a processing task.
    ///
    /// Sends `POST /pipeline/assets/status` with `{"taskId": …}`.
    pub async fn fetch_status(&self, task_id: &str) -> Result<StatusReport, RemoteError> {
        let response = self
            .authorized(self.client.post(self.endpoint("status")))
            .json(&serde_json::json!({ "taskId": task_id }))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/pipeline/assets/{operation}", self.config.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.timeout(self.config.request_timeout);
        match &self.config.api_key {
            Some(key) => request.header(AUTHORIZATION, key),
            None => request,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RemoteError::Api`] carrying
    /// the status and the body's message on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            tracing::debug!(status = status.as_u16(), %message, "Remote returned an error");
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::from_body(status, e))?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Malformed {
            status,
            message: e.to_string(),
        })
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), RemoteError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PipelineRemote for PipelineApi {
    async fn request_stage_slot(&self) -> Result<StageSlot, RemoteError> {
        PipelineApi::request_stage_slot(self).await
    }

    async fn put_bytes(&self, url: &str, file: &FileRef) -> Result<(), RemoteError> {
        PipelineApi::put_bytes(self, url, file).await
    }

    async fn submit_process(&self, key: &str, pipeline: &str) -> Result<ProcessTicket, RemoteError> {
        PipelineApi::submit_process(self, key, pipeline).await
    }

    async fn fetch_status(&self, task_id: &str) -> Result<StatusReport, RemoteError> {
        PipelineApi::fetch_status(self, task_id).await
    }
}
