//! Integration tests for configuration loading and validation

use ragchat_core::config::{load, load_from_json, load_from_yaml, ConfigError};
use ragchat_core::stream::DecodeMode;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    use std::env;
    env::set_var("RAGCHAT_CFG_HOST", "rag.internal");

    let yaml = r#"
version: "0.1"
endpoint:
  base_url: https://${RAGCHAT_CFG_HOST}:8443
connection:
  connect_timeout_ms: 2000
  request_timeout_ms: 600000
upload:
  max_file_size_bytes: 1048576
  allowed_extensions: [txt, md]
stream:
  decode_mode: strict
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    let config = load_from_yaml(path).expect("config should load");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.endpoint.base_url, "https://rag.internal:8443");
    assert_eq!(config.connection.connect_timeout_ms, 2000);
    assert_eq!(config.connection.max_idle_per_host, 10);
    assert_eq!(config.upload.allowed_extensions, vec!["txt", "md"]);
    assert_eq!(config.stream.decode_mode, DecodeMode::Strict);

    env::remove_var("RAGCHAT_CFG_HOST");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
  "version": "0.1",
  "endpoint": { "base_url": "http://localhost:9000" }
}"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    let config = load_from_json(&path).expect("config should load");
    assert_eq!(config.endpoint.base_url, "http://localhost:9000");
    assert_eq!(config.upload.max_file_size_bytes, 16 * 1024 * 1024);
    assert_eq!(config.stream.decode_mode, DecodeMode::Replace);

    // Format picked from the extension
    let again = load(&path).unwrap();
    assert_eq!(again.endpoint.base_url, config.endpoint.base_url);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yml", "version: \"0.1\"\n");

    let config = load(path).unwrap();
    assert_eq!(config.endpoint.base_url, "http://localhost:8000");
    assert_eq!(config.connection.request_timeout_ms, 300000);
}

#[test]
fn test_missing_version_field() {
    let yaml = r#"
endpoint:
  base_url: http://localhost:8000
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { message, .. }) => {
            assert!(message.contains("version"), "unexpected message: {}", message);
        }
        other => panic!("Expected parse error for missing version, got: {:?}", other),
    }
}

#[test]
fn test_invalid_version() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "version: \"2.0\"\n");

    if let Err(ConfigError::ValidationError(e)) = load_from_yaml(path) {
        assert_eq!(e.field_path, "version");
    } else {
        panic!("Expected validation error for invalid version");
    }
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: http://localhost:8000
  api_key: nope
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    assert!(matches!(
        load_from_yaml(path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_invalid_url_format() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: not-a-url
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    if let Err(ConfigError::ValidationError(e)) = load_from_yaml(path) {
        assert_eq!(e.field_path, "endpoint.base_url");
    } else {
        panic!("Expected validation error for invalid URL");
    }
}

#[test]
fn test_request_timeout_shorter_than_connect_timeout() {
    let yaml = r#"
version: "0.1"
connection:
  connect_timeout_ms: 5000
  request_timeout_ms: 1000
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    if let Err(ConfigError::ValidationError(e)) = load_from_yaml(path) {
        assert_eq!(e.field_path, "connection.request_timeout_ms");
    } else {
        panic!("Expected validation error for timeouts");
    }
}

#[test]
fn test_extension_with_leading_dot_rejected() {
    let yaml = r#"
version: "0.1"
upload:
  allowed_extensions: [".txt"]
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    if let Err(ConfigError::ValidationError(e)) = load_from_yaml(path) {
        assert_eq!(e.field_path, "upload.allowed_extensions[0]");
    } else {
        panic!("Expected validation error for extension format");
    }
}

#[test]
fn test_missing_env_var_reported() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: ${RAGCHAT_CFG_DEFINITELY_UNSET}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => {
            assert_eq!(var, "RAGCHAT_CFG_DEFINITELY_UNSET")
        }
        other => panic!("Expected EnvVarNotFound, got: {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}
