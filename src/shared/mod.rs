//! Shared Module
//!
//! Platform-agnostic types used by every part of the sync core: the event
//! and roster data model, snapshots, the error taxonomy and backend
//! configuration. All types serialize to the JSON shapes the backends use.

/// Event records, ids and roster summaries
pub mod event;

/// Student roster entries
pub mod student;

/// Immutable form captures
pub mod snapshot;

/// Shared error types
pub mod error;

/// Form value normalization and lenient deserializers
pub mod format;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{next_event_id, EventId, EventRecord, EventSummary, RosterSummary};
pub use student::{Illness, StudentRecord};
pub use snapshot::SyncSnapshot;
pub use error::{SyncError, SyncResult};
pub use config::{AppConfig, AppConfigBuilder, BackendKind, ConfigError};
