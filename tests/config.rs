use repostats::config::Config;
use repostats::utils::datetime::DateStyle;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "");
    assert_eq!(config.api.environment, "development");
    assert_eq!(config.fetch.timeout_ms, 12_000);
    assert_eq!(config.fetch.max_retries, 2);
    assert_eq!(config.fetch.retry_backoff_ms, 1_000);
    assert_eq!(config.fetch.poll_interval_ms, 5_000);
    assert!(config.fetch.show_global_indicator);
    assert!(!config.fetch.indicator_while_polling);
    assert_eq!(config.display.date_style, DateStyle::Medium);
    assert!(!config.logging.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    config.fetch.timeout_ms = 0;
    assert!(config.validate().is_err());

    config.fetch.timeout_ms = 500_000;
    assert!(config.validate().is_err());

    config = Config::default();
    config.fetch.poll_interval_ms = 100;
    assert!(config.validate().is_err());

    config = Config::default();
    config.fetch.max_retries = 50;
    assert!(config.validate().is_err());

    config = Config::default();
    config.api.environment = "staging".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.api.base_url = "backend:8000".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.display.date_style = DateStyle::Custom;
    config.display.custom_pattern = "  ".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("timeout_ms = 12000"));
    assert!(toml_str.contains("poll_interval_ms = 5000"));
    assert!(toml_str.contains("date_style = \"medium\""));
}

#[test]
fn test_partial_config_deserialization() {
    let partial_toml = r#"
[fetch]
timeout_ms = 3000

[display]
date_style = "long"

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    assert_eq!(config.fetch.timeout_ms, 3_000);
    assert_eq!(config.display.date_style, DateStyle::Long);
    assert!(config.logging.enabled);

    // Unspecified values fall back to defaults
    assert_eq!(config.fetch.max_retries, 2);
    assert_eq!(config.fetch.poll_interval_ms, 5_000);
    assert_eq!(config.api.environment, "development");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.fetch.timeout_ms, default_config.fetch.timeout_ms);
    assert_eq!(config.api.environment, default_config.api.environment);
    assert_eq!(config.display.date_style, default_config.display.date_style);
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_resolve_base_url_precedence() {
    let mut config = Config::default();
    assert_eq!(config.resolve_base_url_with(no_env), "http://localhost:8000");

    config.api.environment = "production".to_string();
    assert_eq!(config.resolve_base_url_with(no_env), "http://backend:8000");

    config.api.base_url = "https://stats.example.com/".to_string();
    assert_eq!(config.resolve_base_url_with(no_env), "https://stats.example.com");

    let env = |name: &str| (name == "REPOSTATS_API_URL").then(|| "http://override:9000".to_string());
    assert_eq!(config.resolve_base_url_with(env), "http://override:9000");
}

#[test]
fn test_resolve_base_url_from_environment_name() {
    let config = Config::default();
    let env = |name: &str| (name == "REPOSTATS_ENV").then(|| "production".to_string());
    assert_eq!(config.resolve_base_url_with(env), "http://backend:8000");

    let blank = |name: &str| (name == "REPOSTATS_API_URL").then(|| "   ".to_string());
    assert_eq!(config.resolve_base_url_with(blank), "http://localhost:8000");
}

#[test]
fn test_generate_and_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# repostats Configuration File"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.fetch.timeout_ms, Config::default().fetch.timeout_ms);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[fetch]\npoll_interval_ms = 10\n").unwrap();

    assert!(Config::load_from_file(&path).is_err());
}
