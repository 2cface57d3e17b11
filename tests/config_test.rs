//! Configuration loading from files and the environment.

use std::io::Write;

use forumgate::config::{Config, ConfigError, SystemConfig};
use forumgate::system::{SystemKind, SystemRegistry};
use serial_test::serial;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[http]
timeout_secs = 15

[[systems]]
type = "discourse"
url = "https://forum.example.com"

[systems.credentials]
client_id = "abc"
key = "secret"

[[systems]]
type = "lemmy"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_from_env_reads_configured_path() {
    let file = write_config(CONFIG);
    std::env::set_var("FORUMGATE_CONFIG", file.path());
    std::env::remove_var("FORUMGATE_HTTP_TIMEOUT_SECS");

    let config = Config::from_env().unwrap();
    std::env::remove_var("FORUMGATE_CONFIG");

    assert_eq!(config.http.timeout_secs, 15);
    assert_eq!(config.systems.len(), 2);
    assert!(matches!(config.systems[0], SystemConfig::Discourse(_)));
    config.validate().unwrap();
}

#[test]
#[serial]
fn test_env_overrides_http_settings() {
    let file = write_config(CONFIG);
    std::env::set_var("FORUMGATE_CONFIG", file.path());
    std::env::set_var("FORUMGATE_HTTP_TIMEOUT_SECS", "45");
    std::env::set_var("FORUMGATE_RETRY_WAIT_MIN_MS", "250");

    let config = Config::from_env();
    std::env::remove_var("FORUMGATE_CONFIG");
    std::env::remove_var("FORUMGATE_HTTP_TIMEOUT_SECS");
    std::env::remove_var("FORUMGATE_RETRY_WAIT_MIN_MS");

    let config = config.unwrap();
    assert_eq!(config.http.timeout_secs, 45);
    assert_eq!(config.http.retry_wait_min_ms, 250);
}

#[test]
#[serial]
fn test_invalid_env_override() {
    let file = write_config(CONFIG);
    std::env::set_var("FORUMGATE_CONFIG", file.path());
    std::env::set_var("FORUMGATE_HTTP_TIMEOUT_SECS", "soon");

    let result = Config::from_env();
    std::env::remove_var("FORUMGATE_CONFIG");
    std::env::remove_var("FORUMGATE_HTTP_TIMEOUT_SECS");

    assert!(matches!(result, Err(ConfigError::ParseInt { .. })));
}

#[test]
#[serial]
fn test_missing_file() {
    std::env::set_var("FORUMGATE_CONFIG", "/nonexistent/forumgate.toml");

    let result = Config::from_env();
    std::env::remove_var("FORUMGATE_CONFIG");

    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_registry_from_file() {
    let file = write_config(CONFIG);
    let config = Config::from_path(file.path()).unwrap();

    let registry = SystemRegistry::from_config(&config).unwrap();

    assert_eq!(registry.len(), 2);
    let discourse = registry.get(0).unwrap();
    assert_eq!(discourse.kind(), SystemKind::Discourse);
    assert_eq!(discourse.filter_value(), "Discourse https://forum.example.com");
    assert_eq!(registry.get(1).unwrap().title(), "");
}
