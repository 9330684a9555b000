//! # Sync State Management
//!
//! `SyncState` is the single mutable record of where synchronization
//! stands. The scheduler task owns it outright; everything else sees a
//! [`SyncStatus`] copy published over a watch channel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::sync::change_detector::ChangeDetector;
use crate::client::sync::metrics::SyncMetrics;
use crate::client::sync::retry::RetryTracker;
use crate::shared::error::SyncError;
use crate::shared::snapshot::SyncSnapshot;

/// Scheduler phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    /// Nothing waiting, or retries exhausted with the change still pending
    #[default]
    Idle,
    /// Edited; debounce running (or suspended while offline)
    Dirty,
    /// A remote write is in flight
    Syncing,
    /// Waiting before retry `n`
    Backoff(u32),
}

/// Read-only view handed to the UI
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Unsynced snapshots waiting to be written (0 or 1; only the latest is kept)
    pub pending_count: usize,
    pub retry_count: u32,
    pub phase: SyncPhase,
    pub last_error: Option<SyncError>,
    /// Automatic retries stopped; a manual sync or a new edit is needed
    pub failed: bool,
    pub metrics: SyncMetrics,
}

impl SyncStatus {
    /// Whether the last save was rejected for missing required fields
    pub fn is_blocked_by_validation(&self) -> bool {
        self.last_error.as_ref().is_some_and(SyncError::is_validation)
    }
}

#[derive(Debug)]
pub struct SyncState {
    pub is_online: bool,
    pub phase: SyncPhase,
    /// Latest unsynced capture; older ones are discarded
    pub pending: Option<SyncSnapshot>,
    pub retry: RetryTracker,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_error: Option<SyncError>,
    pub detector: ChangeDetector,
    pub metrics: SyncMetrics,
    /// Sync again as soon as the in-flight write resolves
    pub follow_up: bool,
    /// Bumped whenever the session swaps events; in-flight results from an
    /// older generation are not applied
    pub generation: u64,
}

impl SyncState {
    pub fn new(retry: RetryTracker, is_online: bool) -> Self {
        Self {
            is_online,
            phase: SyncPhase::Idle,
            pending: None,
            retry,
            last_sync_time: None,
            last_error: None,
            detector: ChangeDetector::new(),
            metrics: SyncMetrics::new(),
            follow_up: false,
            generation: 0,
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.phase == SyncPhase::Syncing
    }

    pub fn has_outstanding(&self) -> bool {
        self.pending.is_some()
    }

    /// Pending change that is allowed to go out automatically
    pub fn can_auto_sync(&self) -> bool {
        self.has_outstanding()
            && !self.retry.is_exhausted()
            && !self.last_error.as_ref().is_some_and(SyncError::is_validation)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            is_online: self.is_online,
            is_syncing: self.is_syncing(),
            last_sync_time: self.last_sync_time,
            pending_count: usize::from(self.pending.is_some()),
            retry_count: self.retry.attempt(),
            phase: self.phase,
            last_error: self.last_error.clone(),
            failed: self.retry.is_exhausted(),
            metrics: self.metrics.clone(),
        }
    }
}
