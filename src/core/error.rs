//! Error types for store, inventory, notifier and scheduler operations.

use std::time::Duration;

use thiserror::Error;

use crate::core::TrackingId;

/// Errors surfaced by the tracking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The referenced tracking does not exist.
    #[error("tracking {0} not found")]
    NotFound(TrackingId),
    /// Backend-specific failure with context.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors produced by an inventory lookup.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Lookup exceeded its deadline. Feeds the connection health window.
    #[error("inventory lookup timed out after {0:?}")]
    Timeout(Duration),
    /// Response did not have the expected structure.
    #[error("malformed inventory payload: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
        /// Raw payload, already truncated for logging.
        payload: String,
    },
    /// Any other transport failure (connect, TLS, HTTP status).
    #[error("inventory transport error: {0}")]
    Transport(String),
}

/// Errors produced while delivering a user notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be delivered.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
    /// Notifier is not usable with its current configuration.
    #[error("notifier misconfigured: {0}")]
    Config(String),
    /// Upstream asked us to back off.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },
}

/// Umbrella error for scheduler components.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Inventory lookup failure.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    /// Notification failure.
    #[error(transparent)]
    Notify(#[from] NotifyError),
    /// Invalid configuration.
    #[error("config invalid: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
