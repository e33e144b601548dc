use geyser_watch_logger::{init, LogConfig, LogFormat, LogOutput};
use tracing::Level;

#[test]
fn unparsable_level_falls_back_to_info() {
    let config = LogConfig {
        level: "chatty".to_string(),
        ..Default::default()
    };
    assert_eq!(config.max_level(), Level::INFO);

    let config = LogConfig {
        level: "debug".to_string(),
        ..Default::default()
    };
    assert_eq!(config.max_level(), Level::DEBUG);
}

#[test]
fn file_output_requires_a_path() {
    let config = LogConfig {
        output: LogOutput::File,
        file_path: None,
        ..Default::default()
    };
    let err = init(&config).unwrap_err();
    assert!(err.to_string().contains("file_path"));
}

#[test]
fn json_file_logging_writes_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geyser-watch.log");
    let config = LogConfig {
        level: "info".to_string(),
        format: LogFormat::Json,
        output: LogOutput::File,
        file_path: Some(path.to_string_lossy().into_owned()),
    };

    std::env::remove_var("RUST_LOG");
    init(&config).unwrap();
    tracing::info!(slot = 42, "subscribed");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"slot\":42"), "{written}");
    assert!(written.contains("subscribed"));
}
