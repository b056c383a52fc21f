//! Error types for redvalid-ui
//!
//! Three layers:
//! - [`ClientError`]: one backend HTTP call failed
//! - [`WalletError`]: the wallet extension refused or faulted
//! - [`FlowError`]: a view operation stopped (wraps the two above plus
//!   local validation and data-integrity failures)
//!
//! Every variant is terminal for the current attempt. Nothing is retried.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Backend API client errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No response received (connection refused, DNS failure, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its time bound
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Backend rejected the request (400)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upload body exceeded the backend limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Backend refused the content type (415)
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Any other non-success status
    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Map a non-success HTTP status and extracted detail to a variant
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            400 => ClientError::InvalidInput(detail),
            404 => ClientError::NotFound(detail),
            413 => ClientError::PayloadTooLarge(detail),
            415 => ClientError::UnsupportedMediaType(detail),
            _ => ClientError::Backend {
                status,
                message: detail,
            },
        }
    }

    /// HTTP status that produced this error, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::InvalidInput(_) => Some(400),
            ClientError::NotFound(_) => Some(404),
            ClientError::PayloadTooLarge(_) => Some(413),
            ClientError::UnsupportedMediaType(_) => Some(415),
            ClientError::Backend { status, .. } => Some(*status),
            ClientError::Network(_) | ClientError::Timeout(_) | ClientError::Parse(_) => None,
        }
    }

    /// Backend-supplied message, if the backend answered
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::InvalidInput(d)
            | ClientError::NotFound(d)
            | ClientError::PayloadTooLarge(d)
            | ClientError::UnsupportedMediaType(d) => Some(d.as_str()),
            ClientError::Backend { message, .. } => Some(message.as_str()),
            ClientError::Network(_) | ClientError::Timeout(_) | ClientError::Parse(_) => None,
        }
        .filter(|d| !d.trim().is_empty())
    }

    /// True when no response was received at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }
}

/// Wallet extension errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet extension not installed")]
    NotInstalled,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("User rejected the request")]
    UserRejected,

    #[error("Invalid transaction payload: {0}")]
    InvalidPayload(String),

    #[error("Wallet did not return an address")]
    AddressUnavailable,

    /// Fault inside the extension itself
    #[error("Wallet extension error: {0}")]
    Extension(String),
}

/// View operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Local input check failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Backend returned a prepared transaction that cannot be signed
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Pull a human-readable message out of an error response body
///
/// Handles the shapes the backend produces: `detail` as a string, as a list
/// of validation items (each with `msg`), or as an object. Falls back to a
/// top-level `message`, then the raw body, then the status reason phrase.
pub fn extract_detail(body: &str, reason: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.to_string();
    }

    let json: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return trimmed.to_string(),
    };

    match json.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.get("msg").and_then(Value::as_str) {
                Some(msg) => msg.to_string(),
                None => value_text(item),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(obj @ Value::Object(_)) => obj
            .get("message")
            .or_else(|| obj.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| obj.to_string()),
        Some(Value::Null) | None => json
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| json.to_string()),
        Some(other) => other.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ClientError::from_status(400, "bad".into()),
            ClientError::InvalidInput("bad".into())
        );
        assert_eq!(
            ClientError::from_status(413, "big".into()),
            ClientError::PayloadTooLarge("big".into())
        );
        assert_eq!(
            ClientError::from_status(415, "type".into()),
            ClientError::UnsupportedMediaType("type".into())
        );
        assert_eq!(
            ClientError::from_status(502, "gw".into()),
            ClientError::Backend {
                status: 502,
                message: "gw".into()
            }
        );
        assert_eq!(ClientError::from_status(404, "x".into()).status(), Some(404));
    }

    #[test]
    fn test_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail":"Reporter wallet not found."}"#, "Not Found"),
            "Reporter wallet not found."
        );
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail":[
            {"loc":["body","video_url"],"msg":"field required","type":"value_error.missing"},
            {"loc":["body","reporter_wallet"],"msg":"str type expected"}
        ]}"#;
        assert_eq!(
            extract_detail(body, "Unprocessable Entity"),
            "field required; str type expected"
        );
    }

    #[test]
    fn test_detail_list_without_msg_serializes_items() {
        assert_eq!(extract_detail(r#"{"detail":["a", 2]}"#, ""), "a; 2");
    }

    #[test]
    fn test_detail_object() {
        assert_eq!(
            extract_detail(r#"{"detail":{"message":"hash mismatch","code":7}}"#, ""),
            "hash mismatch"
        );
        assert_eq!(
            extract_detail(r#"{"detail":{"code":7}}"#, ""),
            r#"{"code":7}"#
        );
    }

    #[test]
    fn test_detail_fallbacks() {
        assert_eq!(extract_detail(r#"{"message":"nope"}"#, ""), "nope");
        assert_eq!(extract_detail(r#"{"error":true}"#, ""), r#"{"error":true}"#);
        assert_eq!(extract_detail("Internal Server Error", ""), "Internal Server Error");
        assert_eq!(extract_detail("   ", "Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_detail_is_none_for_blank_messages() {
        assert_eq!(ClientError::InvalidInput("  ".into()).detail(), None);
        assert_eq!(ClientError::Network("refused".into()).detail(), None);
        assert!(ClientError::Timeout(Duration::from_secs(30)).is_unreachable());
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            ClientError::Timeout(Duration::from_secs(30)).to_string(),
            "Request timed out after 30s"
        );
    }
}
