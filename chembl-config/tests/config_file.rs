use std::path::PathBuf;

use chembl_config::{ConfigError, LogLevel, ServerConfig, TransportKind, loader};

fn scratch(name: &str, contents: &str) -> PathBuf {
    let file = format!("chembl-config-{}-{name}.json", std::process::id());
    let path = std::env::temp_dir().join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn partial_file_keeps_defaults() {
    let path = scratch(
        "partial",
        r#"{"transport": "http", "deadlines": {"utility_secs": 3}, "log_level": "warn"}"#,
    );

    let config = loader::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.transport, TransportKind::Http);
    assert_eq!(config.log_level, LogLevel::Warning);
    assert!((config.deadlines.utility_secs - 3.0).abs() < f64::EPSILON);
    assert!((config.deadlines.data_query_secs - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.upstream, ServerConfig::default().upstream);
    config.validate().unwrap();
}

#[test]
fn unknown_fields_are_rejected() {
    let path = scratch("unknown", r#"{"prot": 80}"#);

    let err = loader::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn missing_file_reports_path() {
    let err = loader::from_file(std::path::Path::new("/nonexistent/chembl.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/chembl.json"));
}
