//! Client error type and HTTP error mapping utilities

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur when talking to the service
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be established (refused, DNS, TLS)
    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// The transport gave up waiting
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Pulling a chunk from an open response body failed
    #[error("Stream read failed: {message}")]
    StreamRead { message: String },

    /// The response body is not valid text in strict decoding mode
    #[error("Failed to decode response body: {message}")]
    Decode { message: String },

    /// The fragment consumer asked to stop
    #[error("Fragment consumer failed: {0}")]
    Consumer(#[source] anyhow::Error),

    /// A request payload could not be serialized
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// A JSON response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A file was rejected before upload
    #[error("Invalid upload '{filename}': {reason}")]
    InvalidUpload { filename: String, reason: String },

    /// Reading a local file failed
    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The client could not be built from its configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether repeating the same call could succeed
    ///
    /// The library never retries on its own; callers use this to decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Connection { .. }
            | ClientError::Timeout
            | ClientError::StreamRead { .. } => true,
            ClientError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            _ => false,
        }
    }

    /// HTTP status code, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connection {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            ClientError::StreamRead {
                message: err.to_string(),
            }
        } else {
            ClientError::Connection {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

/// Map a non-success HTTP status and its response body to a ClientError
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> ClientError {
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return ClientError::Timeout;
    }

    let message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()))
        });

    ClientError::Status {
        status: status.as_u16(),
        message: format!("{} [request_id: {}]", message, request_id),
    }
}

/// Extract the error text from a JSON error body
fn extract_error_message(json: &Value) -> Option<String> {
    // The service answers failures with { "error": "..." }
    if let Some(error) = json.get("error") {
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
        // Nested form: { "error": { "message": "..." } }
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }

    // FastAPI `HTTPException`: { "detail": "..." }
    if let Some(detail) = json.get("detail").and_then(|v| v.as_str()) {
        return Some(detail.to_string());
    }

    json.get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"error": "文件不存在"}"#, "文件不存在" ; "flat error field")]
    #[test_case(r#"{"error": {"message": "bad input"}}"#, "bad input" ; "nested error object")]
    #[test_case(r#"{"detail": "文件不存在"}"#, "文件不存在" ; "detail field")]
    #[test_case(r#"{"message": "nope"}"#, "nope" ; "message field")]
    #[test_case("plain failure", "plain failure" ; "non json body")]
    fn test_error_message_extraction(body: &str, expected: &str) {
        let id = Uuid::new_v4();
        let err = map_http_error(StatusCode::NOT_FOUND, Some(body.to_string()), id);
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.starts_with(expected), "got {message}");
                assert!(message.contains(&id.to_string()));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, Some(String::new()), Uuid::new_v4());
        assert!(err.to_string().contains("Bad Gateway"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_gateway_timeout_maps_to_timeout() {
        let err = map_http_error(StatusCode::GATEWAY_TIMEOUT, None, Uuid::new_v4());
        assert!(matches!(err, ClientError::Timeout));
    }

    #[test_case(ClientError::Timeout, true)]
    #[test_case(ClientError::Status { status: 400, message: String::new() }, false)]
    #[test_case(ClientError::Status { status: 503, message: String::new() }, true)]
    #[test_case(ClientError::Decode { message: String::new() }, false)]
    fn test_retryable_classification(err: ClientError, retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }
}
