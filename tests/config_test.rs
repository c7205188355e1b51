use std::io::Write as _;

use pipewatch::config::loader::load_config;

#[test]
fn explicit_path_parses_all_sections() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config file");
    write!(
        file,
        r#"
[backend]
base_url = "https://predict.example.com/api"
user_id = "user-7"
token = "file-token"

[defaults]
refetch_interval_minutes = 3
feed_page_size = 10
webhook_pending_expiry_minutes = 20
"#
    )
    .expect("write temp config");

    let config = load_config(Some(file.path())).expect("config should parse");
    assert_eq!(config.backend.base_url, "https://predict.example.com/api");
    assert_eq!(config.backend.user_id, "user-7");
    assert_eq!(config.backend.token.as_deref(), Some("file-token"));
    assert_eq!(config.defaults.refetch_interval_minutes, 3);
    assert_eq!(config.defaults.feed_page_size, 10);
    assert_eq!(config.defaults.webhook_pending_expiry_minutes, 20);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config file");
    write!(
        file,
        r#"
[backend]
user_id = "user-7"
"#
    )
    .expect("write temp config");

    let config = load_config(Some(file.path())).expect("config should parse");
    assert_eq!(config.backend.base_url, "http://localhost:8000");
    assert!(config.backend.token.is_none());
    assert_eq!(config.defaults.refetch_interval_minutes, 10);
    assert_eq!(config.defaults.feed_page_size, 5);
    assert_eq!(config.defaults.webhook_pending_expiry_minutes, 10);
}

#[test]
fn unreadable_explicit_path_is_an_error() {
    let result = load_config(Some(std::path::Path::new(
        "/nonexistent/pipewatch/config.toml",
    )));
    assert!(result.is_err());
}

#[test]
fn invalid_toml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config file");
    write!(file, "backend = not-a-table").expect("write temp config");
    assert!(load_config(Some(file.path())).is_err());
}
