//! Shared Error Types
//!
//! This module defines the error taxonomy used across the sync core. Every
//! remote-facing failure is converted into a [`SyncError`] at the adapter
//! boundary, so nothing above the scheduler ever sees a raw transport error.
//!
//! # Error Categories
//!
//! - `Validation` - required header fields missing; never sent, never retried
//! - `Network` - transport failure; retried with backoff
//! - `BackendUnavailable` - integration layer not configured or not ready; retried
//! - `PartialFailure` - roster delete succeeded but the insert did not; retried
//! - `NotFound` - the requested event does not exist remotely
//! - `Serialization` - JSON encoding or decoding failed
//! - `Storage` - the local database rejected a read or write
//!
//! # Usage
//!
//! ```rust
//! use eventlog_pro::shared::error::SyncError;
//!
//! let error = SyncError::validation("eventName", "Event Name and Date are required");
//! assert!(!error.is_transient());
//! ```
use thiserror::Error;

/// Result alias used throughout the crate
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the sync core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Payload rejected before it reached the backend
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Transport-level failure (connect, timeout, reset)
    #[error("Network error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// The remote integration is not configured, not ready, or returned a server error
    #[error("Backend unavailable: {message}")]
    BackendUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// Roster replacement stopped between the delete and the insert
    #[error("Partial failure: {message}")]
    PartialFailure {
        /// Human-readable error message
        message: String,
    },

    /// Event id unknown to the backend
    #[error("Event not found: {event_id}")]
    NotFound {
        /// The id that was looked up
        event_id: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },

    /// Local database failure
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },
}

impl SyncError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new backend-unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    /// Create a new partial-failure error
    pub fn partial(message: impl Into<String>) -> Self {
        Self::PartialFailure {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(event_id: impl Into<String>) -> Self {
        Self::NotFound {
            event_id: event_id.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether the scheduler should retry this failure with backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::BackendUnavailable { .. } | Self::PartialFailure { .. }
        )
    }

    /// Whether this failure blocks the save until the user fixes the form
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::network(err.to_string())
        } else if err.is_decode() {
            Self::serialization(err.to_string())
        } else {
            Self::unavailable(err.to_string())
        }
    }
}
