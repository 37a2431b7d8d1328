//! Configuration validation tests
//!
//! Tests that verify configuration defaults, validation and credential files.

mod common;

use opnsense_exporter::config::{CollectorsConfig, Config, ExporterConfig, ServerConfig};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;

fn valid_config() -> Config {
    Config {
        opnsense: common::opnsense_config("opnsense.local"),
        server: ServerConfig::default(),
        exporter: ExporterConfig::default(),
        collectors: CollectorsConfig::default(),
    }
}

fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "opnsense-exporter-{}-{}",
        std::process::id(),
        name
    ));
    let mut file = std::fs::File::create(&path).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    path
}

#[test]
fn test_default_server_config() {
    // Given: ServerConfig with default values
    let config = ServerConfig::default();

    // Then: Should have expected default values
    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.metrics_path, "/metrics");
}

#[test]
fn test_default_exporter_config() {
    let config = ExporterConfig::default();

    assert_eq!(config.instance_label, "opnsense");
    assert!(!config.firmware_check_on_start);
    assert!(!config.disable_exporter_metrics);
}

#[test]
fn test_load_without_file_uses_defaults() {
    // Given: A config path that does not exist
    let path = "/nonexistent/opnsense-exporter/config";

    // When: Loading it
    let config = Config::load(path).expect("missing file should not be an error");

    // Then: Every section falls back to its defaults
    assert_eq!(config.opnsense.protocol, "https");
    assert!(config.opnsense.host.is_empty());
    assert!(!config.opnsense.insecure);
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.exporter.instance_label, "opnsense");
}

#[test]
fn test_defaults_plus_overrides_validate() {
    // Given: Defaults from a missing file
    let mut config = Config::load("/nonexistent/opnsense-exporter/config").unwrap();

    // Then: They are rejected until a host and credentials are set
    assert!(config.validate().unwrap_err().to_string().contains("host"));

    config.opnsense.host = "10.0.0.1".to_string();
    config.opnsense.api_key = SecretString::from("key");
    config.opnsense.api_secret = SecretString::from("secret");
    config.opnsense.resolve_credentials().unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.opnsense.base_url(), "https://10.0.0.1");
}

#[test]
fn test_file_without_opnsense_section_loads() {
    // Given: A file that only configures the server
    let path = temp_file("server-only.toml", "[server]\nport = 9999\n");

    // When: Loading it
    let config = Config::load(path.to_str().unwrap()).unwrap();

    // Then: The missing section takes its defaults
    assert_eq!(config.server.port, 9999);
    assert_eq!(config.opnsense.protocol, "https");
    assert!(config.opnsense.host.is_empty());
    std::fs::remove_file(path).ok();
}

#[test]
fn test_valid_config_passes() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_empty_host_is_rejected() {
    // Given: A config without a host
    let mut config = valid_config();
    config.opnsense.host = String::new();

    // When: Validating
    let err = config.validate().unwrap_err();

    // Then: The error names the host
    assert!(err.to_string().contains("host"));
}

#[test]
fn test_empty_api_key_is_rejected() {
    let mut config = valid_config();
    config.opnsense.api_key = SecretString::from("");

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("api_key"));
}

#[test]
fn test_blank_instance_label_is_rejected() {
    let mut config = valid_config();
    config.exporter.instance_label = "  ".to_string();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("instance_label"));
}

#[test]
fn test_metrics_path_must_be_absolute() {
    let mut config = valid_config();
    config.server.metrics_path = "metrics".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_credential_files_win_over_inline_values() {
    // Given: Key and secret files, the secret file carrying extra lines
    let key_file = temp_file("key", "file-key\n");
    let secret_file = temp_file("secret", "  file-secret  \nignored\n");

    let mut config = valid_config();
    config.opnsense.api_key_file = Some(key_file.clone());
    config.opnsense.api_secret_file = Some(secret_file.clone());

    // When: Resolving credentials
    config.opnsense.resolve_credentials().unwrap();

    // Then: The trimmed first lines replace the inline values
    assert_eq!(config.opnsense.api_key.expose_secret(), "file-key");
    assert_eq!(config.opnsense.api_secret.expose_secret(), "file-secret");

    let _ = std::fs::remove_file(key_file);
    let _ = std::fs::remove_file(secret_file);
}

#[test]
fn test_empty_credential_file_keeps_inline_value() {
    let key_file = temp_file("empty-key", "");

    let mut config = valid_config();
    config.opnsense.api_key_file = Some(key_file.clone());
    config.opnsense.resolve_credentials().unwrap();

    assert_eq!(config.opnsense.api_key.expose_secret(), "key");
    let _ = std::fs::remove_file(key_file);
}

#[test]
fn test_missing_credential_file_is_an_error() {
    let mut config = valid_config();
    config.opnsense.api_secret_file = Some("/nonexistent/opnsense-secret".into());

    let err = config.opnsense.resolve_credentials().unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}
