use std::fs;

use log::{LevelFilter, Log};
use repostats::config::LoggingConfig;
use repostats::logger::Logger;

#[test]
fn test_level_filter_parsing() {
    assert_eq!(Logger::level_filter("debug").unwrap(), LevelFilter::Debug);
    assert_eq!(Logger::level_filter(" WARN ").unwrap(), LevelFilter::Warn);
    assert_eq!(Logger::level_filter("off").unwrap(), LevelFilter::Off);
    assert!(Logger::level_filter("chatty").is_err());
}

#[test]
fn test_log_file_path_location() {
    if let Ok(path) = Logger::get_log_file_path() {
        assert!(path.ends_with("repostats/repostats.log"));
    }
}

#[test]
fn test_file_dispatch_writes_formatted_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("repostats.log");
    let config = LoggingConfig {
        enabled: true,
        level: "debug".to_string(),
    };

    let (_, logger) = Logger::dispatch(&config, Some(path.as_path())).unwrap().into_log();
    logger.log(
        &log::Record::builder()
            .args(format_args!("fetched /api/commits"))
            .level(log::Level::Info)
            .target("repostats::fetch")
            .build(),
    );
    logger.log(
        &log::Record::builder()
            .args(format_args!("too detailed"))
            .level(log::Level::Trace)
            .target("repostats::fetch")
            .build(),
    );
    logger.flush();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("INFO repostats::fetch] fetched /api/commits"));
    assert!(!content.contains("too detailed"));
}

#[test]
fn test_invalid_level_is_rejected_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        enabled: true,
        level: "verbose".to_string(),
    };
    assert!(Logger::dispatch(&config, Some(dir.path().join("x.log").as_path())).is_err());
}
