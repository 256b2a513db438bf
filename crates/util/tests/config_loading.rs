use std::fs;

use inview_util::{API_BASE_ENV, API_KEY_ENV, ConfigError, EditorConfig, load_config_from_path};

#[test]
fn missing_file_yields_defaults() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("absent.json");
    temp_env::with_vars_unset([API_BASE_ENV, API_KEY_ENV], || {
        let config = load_config_from_path(&path).expect("defaults");
        assert_eq!(config, EditorConfig::default());
    });
}

#[test]
fn file_values_are_loaded_and_env_wins() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("config.json");
    fs::write(
        &path,
        r#"{"baseUrl":"http://localhost:3000/api/datasources/uid/abc/resources","debounceMs":250,"pageSize":25}"#,
    )
    .expect("write config");

    temp_env::with_vars(
        [
            (API_BASE_ENV, Some("https://grafana.example.com/api/datasources/uid/abc/resources")),
            (API_KEY_ENV, Some("key-123")),
        ],
        || {
            let config = load_config_from_path(&path).expect("config");
            assert_eq!(config.debounce_ms, 250);
            assert_eq!(config.page_size, 25);
            assert_eq!(
                config.base_url.as_deref(),
                Some("https://grafana.example.com/api/datasources/uid/abc/resources")
            );
            assert_eq!(config.api_key.as_deref(), Some("key-123"));
        },
    );
}

#[test]
fn malformed_file_is_an_error() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("config.json");
    fs::write(&path, "{ not json").expect("write config");
    let error = load_config_from_path(&path).expect_err("parse error");
    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn unknown_fields_are_rejected() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("config.json");
    fs::write(&path, r#"{"apiKey":"should-not-live-here"}"#).expect("write config");
    assert!(load_config_from_path(&path).is_err());
}
