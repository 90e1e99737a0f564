//! Configuration validation utilities

use super::env::ENV_VAR_PATTERN;
use super::error::{ValidationError, ValidationErrorKind};
use super::schema::ClientConfig;
use tracing::warn;

/// Configuration validator with additional validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Reject plain `http://` base URLs that do not point at a loopback host
    require_tls_for_remote: bool,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail instead of warn when a remote base URL is not https
    pub fn require_tls_for_remote(mut self, required: bool) -> Self {
        self.require_tls_for_remote = required;
        self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_placeholders(config)?;
        self.validate_base_url(config)?;

        Ok(())
    }

    /// Placeholders must be resolved before the config is used
    fn validate_placeholders(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        if let Some(var) = self.extract_env_vars(&config.endpoint.base_url).first() {
            return Err(ValidationError::invalid_format(
                "endpoint.base_url",
                format!("unresolved environment variable '{}'", var),
            ));
        }

        Ok(())
    }

    /// Check the shape of the base URL beyond what `url` parsing covers
    fn validate_base_url(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        let url = match url::Url::parse(&config.endpoint.base_url) {
            Ok(url) => url,
            // Already reported by the built-in validation
            Err(_) => return Ok(()),
        };

        // API paths are appended to the base URL
        if url.path().trim_end_matches('/').ends_with("/api") {
            return Err(ValidationError::new(
                "endpoint.base_url",
                ValidationErrorKind::Incompatible {
                    message: "base URL must not include the /api prefix".to_string(),
                },
            ));
        }

        let is_loopback = match url.host() {
            Some(url::Host::Domain(domain)) => domain == "localhost",
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };

        if url.scheme() == "http" && !is_loopback {
            if self.require_tls_for_remote {
                return Err(ValidationError::new(
                    "endpoint.base_url",
                    ValidationErrorKind::InvalidUrl {
                        message: "remote endpoints must use https".to_string(),
                    },
                ));
            }
            warn!(
                "Base URL {} sends conversations to a remote host without TLS",
                config.endpoint.base_url
            );
        }

        Ok(())
    }

    /// Extract environment variables from a string
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        ENV_VAR_PATTERN
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
