/**
 * Sync snapshots
 *
 * A `SyncSnapshot` is an immutable capture of the form at one moment. It is
 * what the local backup slot stores and what the scheduler queues for the
 * next remote write. A newer capture supersedes an older one; snapshots are
 * never mutated in place.
 */
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::event::EventRecord;

/// Form contents plus the moment they were captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub event_data: EventRecord,
    pub captured_at: DateTime<Utc>,
}

impl SyncSnapshot {
    /// Capture `record` now
    pub fn capture(record: EventRecord) -> Self {
        Self::at(record, Utc::now())
    }

    /// Capture `record` with an explicit timestamp
    pub fn at(record: EventRecord, captured_at: DateTime<Utc>) -> Self {
        Self {
            event_data: record,
            captured_at,
        }
    }

    /// Captured no earlier than `window` before `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.captured_at >= now - window
    }
}
