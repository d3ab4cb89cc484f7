//! Tests for agent configuration loading and validation

use super::*;

const FULL: &str = r#"
files:
  - path: /var/log/nginx/access.log
    format: nginx-access
    paths: ["/logs/default", "/logs/web"]
  - path: /var/log/app/app.jsonl
    format: jsonlines
    paths: ["/events/app1"]
general:
  log_level: debug
  buffer_size: 500
  retry_count: 2
  retry_delay: "10s"
  max_file_size: "50MB"
"#;

#[test]
fn test_full_config_parse() {
    let config = Config::from_str(FULL).unwrap();

    assert_eq!(config.files.len(), 2);
    assert_eq!(config.files[0].format, "nginx-access");
    assert_eq!(config.files[0].paths, vec!["/logs/default", "/logs/web"]);
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.buffer_size, 500);
    assert_eq!(config.general.retry_delay, Duration::from_secs(10));
    assert_eq!(config.general.max_file_size, "50MB");
}

#[test]
fn test_general_defaults() {
    let yaml = r#"
files:
  - path: /var/log/x.log
    format: jsonlines
    paths: ["/logs/x"]
"#;
    let config = Config::from_str(yaml).unwrap();

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.buffer_size, 1000);
    assert_eq!(config.general.retry_count, 3);
    assert_eq!(config.general.retry_delay, Duration::from_secs(5));
}

#[test]
fn test_empty_config_fails_validation() {
    let result = Config::from_str("");
    assert!(matches!(result, Err(ConfigError::NoFiles)));
}

#[test]
fn test_unknown_format_rejected() {
    let yaml = r#"
files:
  - path: /var/log/x.log
    format: syslog
    paths: ["/logs/x"]
"#;
    let result = Config::from_str(yaml);
    assert!(matches!(result, Err(ConfigError::UnknownFormat { .. })));
}

#[test]
fn test_missing_targets_rejected() {
    let yaml = r#"
files:
  - path: /var/log/x.log
    format: jsonlines
    paths: []
"#;
    let result = Config::from_str(yaml);
    assert!(matches!(result, Err(ConfigError::NoTargets { .. })));
}

#[test]
fn test_empty_path_rejected() {
    let yaml = r#"
files:
  - path: ""
    format: jsonlines
    paths: ["/logs/x"]
"#;
    let result = Config::from_str(yaml);
    assert!(matches!(result, Err(ConfigError::EmptyPath { index: 0 })));
}

#[test]
fn test_invalid_yaml() {
    assert!(Config::from_str("files: [not closed").is_err());
}

#[test]
fn test_load_creates_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etc").join("jslwatcher.conf");

    assert!(!path.exists());
    let config = Config::load(&path).unwrap();

    // The file was written and matches the shipped defaults
    assert!(path.exists());
    assert_eq!(config.files.len(), 2);
    assert_eq!(config.files[0].format, "nginx-access");

    // A second load reads the same file back
    let again = Config::load(&path).unwrap();
    assert_eq!(again.files.len(), config.files.len());
}

#[test]
fn test_default_config_validates() {
    Config::default_config().validate().unwrap();
}
