//! Errors from the remote pipeline layer.

/// A failed remote call.
///
/// [`Api`](Self::Api) and [`Malformed`](Self::Malformed) mean the remote
/// answered; [`Transport`](Self::Transport) means no response arrived.
/// [`InvalidRequest`](Self::InvalidRequest) means nothing was sent at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote returned a non-2xx status code. `message` is taken from
    /// the response body when it carries one.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        message: String,
    },

    /// The remote returned a success status but a body that could not be
    /// read or does not match the expected shape.
    #[error("unexpected response from remote (HTTP {status}): {message}")]
    Malformed { status: u16, message: String },

    /// The request could not be built, e.g. an upload URL handed out by
    /// the remote that does not parse.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request never produced a response (connect, DNS, TLS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    /// HTTP status of the remote response, if there was one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Malformed { status, .. } => Some(*status),
            Self::InvalidRequest(_) | Self::Transport(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Classify a [`reqwest::Error`] raised while reading the body of a
    /// response that arrived with `status`.
    pub(crate) fn from_body(status: u16, err: reqwest::Error) -> Self {
        Self::Malformed {
            status,
            message: error_chain(&err),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_builder() {
            return Self::InvalidRequest(message);
        }
        match err.status() {
            Some(status) if err.is_body() || err.is_decode() => Self::Malformed {
                status: status.as_u16(),
                message,
            },
            _ => Self::Transport(message),
        }
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Pull a human-readable message out of an error response body.
///
/// Looks for a JSON `message` field, then an `error` field, then falls
/// back to the raw text, then to the status code's reason phrase.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = map.get(field) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
