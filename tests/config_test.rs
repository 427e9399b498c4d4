//! Tests for server configuration loading.

use std::io::Write;

use tempfile::NamedTempFile;

use strictly_squares::{
    BroadcastGateway, DEFAULT_BUSY_TIMEOUT_MS, GridEvent, NotificationGateway, ServerConfig,
};
use tokio::sync::broadcast::error::RecvError;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 3000);
    assert_eq!(config.database_path(), "strictly_squares.db");
    assert_eq!(*config.busy_timeout_ms(), DEFAULT_BUSY_TIMEOUT_MS);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("port = 8080\ndatabase_path = \"pool.db\"\n");
    let config = ServerConfig::from_file(file.path()).expect("Load failed");
    assert_eq!(*config.port(), 8080);
    assert_eq!(config.database_path(), "pool.db");
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.event_buffer(), 256);
}

#[test]
fn test_malformed_file_is_error() {
    let file = write_config("port = \"not a number\"\n");
    let err = ServerConfig::from_file(file.path()).expect_err("Should fail");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ServerConfig::load_or_default(dir.path().join("absent.toml"))
        .expect("Load failed");
    assert_eq!(config, ServerConfig::default());
}

#[test]
fn test_cli_overrides_win() {
    let file = write_config("host = \"0.0.0.0\"\nport = 8080\n");
    let config = ServerConfig::from_file(file.path())
        .expect("Load failed")
        .with_overrides(None, Some(9090), Some("override.db".to_string()));
    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(*config.port(), 9090);
    assert_eq!(config.database_path(), "override.db");
}

#[tokio::test]
async fn test_event_buffer_sizes_the_gateway() {
    let file = write_config("event_buffer = 2\n");
    let config = ServerConfig::from_file(file.path()).expect("Load failed");
    let gateway = BroadcastGateway::new(*config.event_buffer());
    let mut events = gateway.subscribe();

    for grid_id in 1..=3 {
        gateway
            .publish(GridEvent::GridSealed { grid_id })
            .await
            .expect("Publish failed");
    }
    assert!(matches!(events.recv().await, Err(RecvError::Lagged(1))));
}
