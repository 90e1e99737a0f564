//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::stream::DecodeMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Only schema version understood by this release
pub const SUPPORTED_VERSION: &str = "0.1";

/// Root configuration structure for the client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Where the service lives
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Connection settings for the HTTP client
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Local checks applied before uploading to the knowledge base
    #[serde(default)]
    pub upload: UploadConfig,

    /// Streaming response handling
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            endpoint: EndpointConfig::default(),
            connection: ConnectionConfig::default(),
            upload: UploadConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at another base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            endpoint: EndpointConfig {
                base_url: base_url.into(),
            },
            ..Default::default()
        }
    }
}

/// Service endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Base URL every API path is appended to (supports env interpolation)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds, covering the whole streamed body
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
            keepalive_secs: default_keepalive(),
        }
    }
}

impl ConnectionConfig {
    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Idle pool timeout as a `Duration`
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

/// Upload pre-flight configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Largest file accepted for upload, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Lowercase file extensions accepted for upload, without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploadConfig {
    /// Check a file name against the allowed extensions (case-insensitive)
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

/// Streaming configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// How undecodable bytes in the response body are handled
    #[serde(default)]
    pub decode_mode: DecodeMode,
}

// Default value functions for serde
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_connect_timeout() -> u64 { 10000 }
fn default_request_timeout() -> u64 { 300000 }
fn default_max_idle() -> usize { 10 }
fn default_keepalive() -> u64 { 90 }
fn default_max_file_size() -> u64 { 16 * 1024 * 1024 }
fn default_allowed_extensions() -> Vec<String> { vec!["txt".to_string(), "docx".to_string()] }

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Validate version
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != SUPPORTED_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: SUPPORTED_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.endpoint.validate("endpoint")?;
        self.connection.validate("connection")?;
        self.upload.validate("upload")?;

        Ok(())
    }
}

impl EndpointConfig {
    /// Validate endpoint configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::required(format!("{}.base_url", path)));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::new(
                        format!("{}.base_url", path),
                        ValidationErrorKind::InvalidUrl {
                            message: format!("URL scheme must be http or https, got: {}", url.scheme()),
                        },
                    ));
                }
                if url.query().is_some() || url.fragment().is_some() {
                    return Err(ValidationError::new(
                        format!("{}.base_url", path),
                        ValidationErrorKind::InvalidUrl {
                            message: "base URL must not carry a query or fragment".to_string(),
                        },
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::new(
                    format!("{}.base_url", path),
                    ValidationErrorKind::InvalidUrl {
                        message: e.to_string(),
                    },
                ));
            }
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms < self.connect_timeout_ms {
            return Err(ValidationError::new(
                format!("{}.request_timeout_ms", path),
                ValidationErrorKind::Incompatible {
                    message: "Must be >= connect_timeout_ms".to_string(),
                },
            ));
        }

        Ok(())
    }
}

impl UploadConfig {
    /// Validate upload configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_file_size_bytes == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_file_size_bytes", path),
                "Must be greater than 0",
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(ValidationError::required(format!("{}.allowed_extensions", path))
                .with_context("At least one extension must be allowed"));
        }

        let mut seen = std::collections::HashSet::new();
        for (i, ext) in self.allowed_extensions.iter().enumerate() {
            let ext_path = format!("{}.allowed_extensions[{}]", path, i);

            if ext.is_empty() || ext.starts_with('.') || ext.chars().any(|c| c.is_uppercase()) {
                return Err(ValidationError::invalid_format(
                    ext_path,
                    "Extensions are lowercase and written without the leading dot",
                ));
            }

            if !seen.insert(ext) {
                return Err(ValidationError::new(
                    ext_path,
                    ValidationErrorKind::DuplicateValue { value: ext.clone() },
                ));
            }
        }

        Ok(())
    }
}
