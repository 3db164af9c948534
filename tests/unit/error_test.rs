//! Tests for error types

use std::time::Duration;

use seatwatch::core::{InventoryError, NotifyError, StoreError, WatchError};

#[test]
fn test_store_not_found_error() {
    let err = StoreError::NotFound(42);
    assert_eq!(format!("{err}"), "tracking 42 not found");
}

#[test]
fn test_timeout_error() {
    let err = InventoryError::Timeout(Duration::from_secs(5));
    assert_eq!(format!("{err}"), "inventory lookup timed out after 5s");
}

#[test]
fn test_malformed_error_hides_payload() {
    let err = InventoryError::Malformed {
        reason: "expected value at line 1 column 1".to_string(),
        payload: "<html>".to_string(),
    };
    assert_eq!(format!("{err}"), "malformed inventory payload: expected value at line 1 column 1");
}

#[test]
fn test_rate_limited_error() {
    let err = NotifyError::RateLimited { retry_after_secs: 7 };
    assert_eq!(format!("{err}"), "rate limited: retry after 7s");
}

#[test]
fn test_watch_error_is_transparent() {
    let err: WatchError = StoreError::Unavailable("connection refused".to_string()).into();
    assert_eq!(format!("{err}"), "store unavailable: connection refused");
    assert!(matches!(err, WatchError::Store(_)));

    let err: WatchError = InventoryError::Transport("reset".to_string()).into();
    assert!(matches!(err, WatchError::Inventory(InventoryError::Transport(_))));
}

#[test]
fn test_app_result_wraps_typed_errors() {
    fn load() -> seatwatch::core::AppResult<()> {
        let sent: Result<(), NotifyError> = Err(NotifyError::Config("bot token missing".to_string()));
        sent?;
        Ok(())
    }
    let err = load().unwrap_err();
    assert!(err.to_string().contains("bot token missing"));
}
