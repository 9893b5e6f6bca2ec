//! Wire types exchanged with the remote pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// One upload destination returned by the stage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSlot {
    /// Pre-signed URL that accepts a single `PUT` of the file bytes.
    pub url: String,
    /// Asset key used to reference the upload in later calls.
    pub key: String,
}

/// Response of the process endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTicket {
    #[serde(deserialize_with = "string_or_number")]
    pub task_id: String,
    /// Any other fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Interpretation of a [`StatusReport::status`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Succeeded,
    /// The remote reports the task as failed or cancelled.
    Failed,
    /// Anything else: queued, running, or a value we do not recognize.
    InProgress,
}

impl StatusReport {
    pub fn outcome(&self) -> RemoteStatus {
        match self.status.trim().to_ascii_uppercase().as_str() {
            "SUCCEEDED" => RemoteStatus::Succeeded,
            "FAILED" | "ERROR" | "CANCELLED" | "CANCELED" => RemoteStatus::Failed,
            _ => RemoteStatus::InProgress,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
