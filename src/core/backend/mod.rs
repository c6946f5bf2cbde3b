//! The remote model service as seen by the chat client.
//!
//! A [`ChatBackend`] hands out [`ChatSession`]s; a session keeps whatever
//! conversation state the service needs and streams one reply per message.
//! The client never inspects session history: it only feeds messages in and
//! renders the text deltas that come back.

pub mod openai;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub use openai::{OpenAiBackend, OpenAiSettings};

/// Text deltas of a single reply, in arrival order.
pub type ReplyStream = BoxStream<'static, Result<String, ApiError>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Human-readable provider label shown in the title bar.
    fn provider_name(&self) -> &str;

    fn model(&self) -> &str;

    /// Open a fresh conversation with no prior turns.
    async fn start_session(&self) -> Result<Arc<dyn ChatSession>, ApiError>;
}

#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Send `message` as the next user turn and stream the reply.
    ///
    /// The turn becomes part of the session history only once the returned
    /// stream has ended without an error.
    async fn stream_reply(&self, message: String) -> Result<ReplyStream, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset).
    Transport(String),

    /// The service answered with a non-success status.
    Status { status: u16, body: String },

    /// The service sent a payload mid-stream that was not a delta.
    Stream(String),

    /// Client-side setup problem, such as a missing API key.
    Setup(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(message) => write!(f, "Request failed: {message}"),
            ApiError::Status { status, body } => {
                write!(f, "{}", format_api_error(Some(*status), body))
            }
            ApiError::Stream(payload) => write!(f, "{}", format_api_error(None, payload)),
            ApiError::Setup(message) => write!(f, "{message}"),
        }
    }
}

impl StdError for ApiError {}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Render an error body from the service as transcript text.
///
/// JSON bodies are pretty-printed under a one-line summary when one can be
/// found; anything else is shown trimmed.
pub fn format_api_error(status: Option<u16>, body: &str) -> String {
    let heading = match status {
        Some(code) => format!("API Error ({code})"),
        None => "API Error".to_string(),
    };
    let trimmed = body.trim();

    if trimmed.is_empty() {
        return format!("{heading}: <empty response>");
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty) = serde_json::to_string_pretty(&json_value) {
            return match extract_error_summary(&json_value) {
                Some(summary) if !summary.is_empty() => {
                    format!("{heading}: {summary}\n{pretty}")
                }
                _ => format!("{heading}:\n{pretty}"),
            };
        }
    }

    format!("{heading}:\n{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_api_error_prettifies_json_with_summary() {
        let raw = r#"{"error":{"message":"model   overloaded","type":"server_error"}}"#;
        let expected = r#"API Error (503): model overloaded
{
  "error": {
    "message": "model   overloaded",
    "type": "server_error"
  }
}"#;
        assert_eq!(format_api_error(Some(503), raw), expected);
    }

    #[test]
    fn format_api_error_handles_json_without_summary() {
        let expected = "API Error:\n{\n  \"status\": \"failed\"\n}";
        assert_eq!(format_api_error(None, r#"{"status":"failed"}"#), expected);
    }

    #[test]
    fn format_api_error_handles_plain_and_empty_bodies() {
        assert_eq!(
            format_api_error(Some(502), "  bad gateway \n"),
            "API Error (502):\nbad gateway"
        );
        assert_eq!(
            format_api_error(Some(500), "   "),
            "API Error (500): <empty response>"
        );
    }

    #[test]
    fn display_uses_status_formatting() {
        let err = ApiError::Status {
            status: 401,
            body: r#"{"error":"invalid key"}"#.to_string(),
        };
        assert!(err.to_string().starts_with("API Error (401): invalid key"));
        assert_eq!(
            ApiError::Transport("connection refused".into()).to_string(),
            "Request failed: connection refused"
        );
    }
}
