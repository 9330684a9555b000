//! # In-Memory Store
//!
//! Two-collection store with the same semantics as the real backends:
//! headers keyed by event id, roster rows numbered per event, roster
//! replaced wholesale on every upsert. Used by tests and offline demos.
//!
//! ## Test hooks
//!
//! - **Failure injection**: queue errors for upcoming writes, or make the
//!   roster insert fail to produce a partial write
//! - **Readiness**: `set_ready(false)` makes `ready()` fail as unavailable
//! - **Latency**: writes sleep before completing, so a test can act while
//!   one is in flight
//! - **Counters**: calls per operation and the highest write concurrency seen

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::client::remote::RemoteStore;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::{sort_by_recency, EventId, EventRecord, EventSummary};
use crate::shared::student::StudentRecord;

#[derive(Debug, Clone)]
struct StoredStudent {
    event_id: EventId,
    row_number: u32,
    student: StudentRecord,
}

#[derive(Debug, Default)]
struct Collections {
    /// Header only; `students` is always empty here
    events: BTreeMap<EventId, EventRecord>,
    students: Vec<StoredStudent>,
}

impl Collections {
    fn roster(&self, event_id: &EventId) -> Vec<StudentRecord> {
        let mut rows: Vec<&StoredStudent> = self
            .students
            .iter()
            .filter(|row| &row.event_id == event_id)
            .collect();
        rows.sort_by_key(|row| row.row_number);
        rows.into_iter().map(|row| row.student.clone()).collect()
    }
}

/// Call counters, read through [`MemoryStore::calls`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub ready: usize,
    pub list: usize,
    pub fetch: usize,
    pub upsert: usize,
    pub delete: usize,
}

#[derive(Debug, Default)]
struct Counters {
    ready: AtomicUsize,
    list: AtomicUsize,
    fetch: AtomicUsize,
    upsert: AtomicUsize,
    delete: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    not_ready: AtomicBool,
    fail_roster_insert: AtomicBool,
    failures: Mutex<VecDeque<SyncError>>,
    latency: Mutex<Duration>,
    /// Every record accepted by `upsert_event`, in order
    accepted: Mutex<Vec<EventRecord>>,
    counters: Counters,
}

/// Decrements the in-flight gauge when a write finishes
struct FlightGuard<'a>(&'a Counters);

impl<'a> FlightGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without touching the counters
    pub async fn insert(&self, record: EventRecord) {
        let mut data = self.data.write().await;
        Self::write_record(&mut data, &record, record.last_modified.unwrap_or_else(Utc::now));
    }

    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::SeqCst);
    }

    /// Fail the next write (upsert or delete) with `error`. Queued errors
    /// are used in order.
    pub fn fail_next_write(&self, error: SyncError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Make roster inserts fail after the roster was deleted
    pub fn fail_roster_insert(&self, fail: bool) {
        self.fail_roster_insert.store(fail, Ordering::SeqCst);
    }

    /// Delay applied to every write
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            ready: c.ready.load(Ordering::SeqCst),
            list: c.list.load(Ordering::SeqCst),
            fetch: c.fetch.load(Ordering::SeqCst),
            upsert: c.upsert.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
        }
    }

    /// Highest number of writes that were in flight at the same time
    pub fn max_concurrent_writes(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Records accepted by `upsert_event`, oldest first
    pub fn accepted_writes(&self) -> Vec<EventRecord> {
        self.accepted.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of roster rows stored for `event_id`
    pub async fn roster_len(&self, event_id: &EventId) -> usize {
        self.data.read().await.roster(event_id).len()
    }

    fn next_failure(&self) -> Option<SyncError> {
        self.failures.lock().ok().and_then(|mut f| f.pop_front())
    }

    async fn simulate_latency(&self) {
        let latency = self.latency.lock().map(|l| *l).unwrap_or_default();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn write_record(data: &mut Collections, record: &EventRecord, at: DateTime<Utc>) {
        // last_modified never goes backwards for an id
        let previous = data
            .events
            .get(&record.event_id)
            .and_then(|existing| existing.last_modified);
        let stamp = previous.map_or(at, |prev| prev.max(at));

        let mut header = record.clone();
        header.students = Vec::new();
        header.last_modified = Some(stamp);
        data.events.insert(record.event_id.clone(), header);

        data.students.retain(|row| row.event_id != record.event_id);
        data.students.extend(
            record
                .persisted_students()
                .into_iter()
                .zip(1u32..)
                .map(|(student, row_number)| StoredStudent {
                    event_id: record.event_id.clone(),
                    row_number,
                    student,
                }),
        );
    }
}

impl RemoteStore for MemoryStore {
    async fn ready(&self) -> SyncResult<()> {
        self.counters.ready.fetch_add(1, Ordering::SeqCst);
        if self.not_ready.load(Ordering::SeqCst) {
            return Err(SyncError::unavailable("memory store not ready"));
        }
        Ok(())
    }

    async fn list_events(&self) -> SyncResult<Vec<EventSummary>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let mut events: Vec<EventSummary> = data.events.values().map(EventRecord::to_summary).collect();
        sort_by_recency(&mut events);
        Ok(events)
    }

    async fn fetch_event(&self, event_id: &EventId) -> SyncResult<Option<EventRecord>> {
        self.counters.fetch.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        Ok(data.events.get(event_id).map(|header| EventRecord {
            students: data.roster(event_id),
            ..header.clone()
        }))
    }

    async fn upsert_event(&self, record: &EventRecord) -> SyncResult<()> {
        self.counters.upsert.fetch_add(1, Ordering::SeqCst);
        let _flight = FlightGuard::enter(&self.counters);
        record.validate()?;
        self.simulate_latency().await;

        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        let mut data = self.data.write().await;
        if self.fail_roster_insert.load(Ordering::SeqCst) {
            // Header written, roster deleted, insert lost
            let mut header = record.clone();
            header.students = Vec::new();
            Self::write_record(&mut data, &header, Utc::now());
            return Err(SyncError::partial(format!(
                "roster for {} was cleared but not rewritten",
                record.event_id
            )));
        }

        Self::write_record(&mut data, record, Utc::now());
        drop(data);

        if let Ok(mut accepted) = self.accepted.lock() {
            accepted.push(record.clone());
        }
        Ok(())
    }

    async fn delete_event(&self, event_id: &EventId) -> SyncResult<()> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        let _flight = FlightGuard::enter(&self.counters);
        self.simulate_latency().await;

        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        let mut data = self.data.write().await;
        data.events.remove(event_id);
        data.students.retain(|row| &row.event_id != event_id);
        Ok(())
    }
}
