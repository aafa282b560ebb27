//! Tests for error types

use prometheus_limiter::core::{LimiterError, RunError};

#[test]
fn test_invalid_channel_error() {
    let err = LimiterError::InvalidChannel("gibberish".to_string());
    assert_eq!(format!("{}", err), "Channel: gibberish is not valid");
}

#[test]
fn test_invalid_options_error() {
    let err = LimiterError::InvalidOptions("limit must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid options: limit must be greater than 0");
}

#[test]
fn test_already_started_error() {
    assert_eq!(format!("{}", LimiterError::AlreadyStarted), "limiter already started");
}

#[test]
fn test_run_error_display() {
    let err: RunError<String> = RunError::Task("connection failed".to_string());
    assert_eq!(format!("{}", err), "task failed: connection failed");

    let err: RunError<String> = LimiterError::Config("bad".into()).into();
    assert_eq!(format!("{}", err), "config error: bad");
    assert!(err.into_task_error().is_none());
}
