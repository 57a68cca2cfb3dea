use std::collections::BTreeMap;

use thiserror::Error;

pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";
pub const CONNECTION_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const CANCELLED_MESSAGE: &str = "The operation was cancelled.";
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend rejected the input field by field (HTTP 422).
    #[error("validation failed: {detail}")]
    Validation {
        detail: String,
        errors: BTreeMap<String, String>,
    },

    #[error("server returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// The message to show the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Timeout => TIMEOUT_MESSAGE.to_string(),
            ClientError::Connection(_) => CONNECTION_MESSAGE.to_string(),
            ClientError::Validation { detail, .. } => detail.clone(),
            ClientError::Api {
                detail: Some(detail), ..
            } if !detail.trim().is_empty() => detail.clone(),
            ClientError::InvalidRequest(message) => message.clone(),
            ClientError::Cancelled => CANCELLED_MESSAGE.to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Per-field messages of a validation failure.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ClientError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Validation { .. } => Some(422),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() || e.is_request() {
            ClientError::Connection(e.to_string())
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                detail: None,
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Pull a human-readable message out of an error body: `detail`, then
/// `message`, then `error`. A `detail` that is a list (FastAPI style) yields
/// its first `msg`.
pub fn detail_from_body(body: &serde_json::Value) -> Option<String> {
    for key in ["detail", "message", "error"] {
        match body.get(key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                if let Some(msg) = items.iter().find_map(|i| i.get("msg").and_then(|m| m.as_str())) {
                    return Some(msg.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Field errors of a 422 body, `{"errors": {"field": "message"}}`.
pub fn field_errors_from_body(body: &serde_json::Value) -> BTreeMap<String, String> {
    body.get("errors")
        .and_then(|e| e.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
