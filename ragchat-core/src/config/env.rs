//! Environment variable interpolation for configuration

use super::error::ConfigError;
use super::schema::ClientConfig;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

/// `${VAR}` placeholder, upper-case names only
pub(crate) static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Interpolate environment variables in a configuration string
///
/// Fails on the first placeholder (in document order) whose variable is unset.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing: Option<String> = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        match env::var(&cap[1]) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| cap[1].to_string());
                cap[0].to_string()
            }
        }
    });

    if let Some(var) = missing {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}

/// Interpolate the fields of an already parsed config that may still hold placeholders
///
/// Only the base URL is eligible; it can be set programmatically after loading.
pub fn interpolate_config_env_vars(config: &mut ClientConfig) -> Result<(), ConfigError> {
    if ENV_VAR_PATTERN.is_match(&config.endpoint.base_url) {
        config.endpoint.base_url = interpolate_env_vars(&config.endpoint.base_url)?;
    }

    Ok(())
}
