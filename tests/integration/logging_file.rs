//! File logging output

use scriptsync::logging::{init_logging, LoggingConfig};
use tempfile::TempDir;

#[test]
fn test_file_output_writes_json_lines() {
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("logs").join("scriptsync.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        output: "file".to_string(),
        file: log_file.clone(),
        ..LoggingConfig::default()
    };

    // Only one global subscriber per process; this is the sole initializer here.
    init_logging(Some(&config)).unwrap();
    tracing::info!(document = "p1/story", "file logging check");

    let contents = std::fs::read_to_string(&log_file).unwrap();
    // Other tests in this binary may log concurrently.
    let line = contents
        .lines()
        .find(|line| line.contains("file logging check"))
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(json["fields"]["document"], "p1/story");
    assert_eq!(json["level"], "INFO");
}
