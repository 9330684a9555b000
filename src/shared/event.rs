/**
 * Event records
 *
 * An `EventRecord` is one school trip: header fields plus an ordered
 * student roster. Event ids use the `YYYY-NNN` format and are assigned by
 * scanning the ids already present for the year.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::{SyncError, SyncResult};
use crate::shared::format::{lenient, split_names};
use crate::shared::student::StudentRecord;

/// Event identifier in `YYYY-NNN` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Build an id from a year and a sequence number, zero-padded to three digits
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!("{}-{:03}", year, sequence))
    }

    /// The first id of a year, used when nothing better is known
    pub fn first_of_year(year: i32) -> Self {
        Self::new(year, 1)
    }

    /// Parse and validate an id
    pub fn parse(value: &str) -> SyncResult<Self> {
        let id = Self(value.trim().to_string());
        match (id.year(), id.sequence()) {
            (Some(_), Some(_)) => Ok(id),
            _ => Err(SyncError::validation(
                "eventId",
                format!("'{}' is not in YYYY-NNN format", value.trim()),
            )),
        }
    }

    /// Wrap a raw value without validation (ids coming back from a backend)
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Year prefix, if well formed
    pub fn year(&self) -> Option<i32> {
        let (year, _) = self.0.split_once('-')?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        year.parse().ok()
    }

    /// Numeric sequence suffix, if well formed
    pub fn sequence(&self) -> Option<u32> {
        let (_, sequence) = self.0.split_once('-')?;
        if sequence.len() < 3 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        sequence.parse().ok()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Next unused id for `year`: the highest existing sequence for that year plus one.
///
/// Ids from other years and malformed ids are ignored. With no ids for the
/// year the result is `{year}-001`.
pub fn next_event_id<'a>(year: i32, existing: impl IntoIterator<Item = &'a EventId>) -> EventId {
    let highest = existing
        .into_iter()
        .filter(|id| id.year() == Some(year))
        .filter_map(EventId::sequence)
        .max()
        .unwrap_or(0);
    EventId::new(year, highest.saturating_add(1))
}

/// One trip/event with its roster
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    pub event_id: EventId,
    #[serde(deserialize_with = "lenient::string")]
    pub event_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub event_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub venue: String,
    #[serde(rename = "departure", deserialize_with = "lenient::string")]
    pub departure_time: String,
    #[serde(deserialize_with = "lenient::string")]
    pub return_time: String,
    #[serde(deserialize_with = "lenient::string")]
    pub vehicle: String,
    #[serde(deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(deserialize_with = "lenient::string")]
    pub accompanying: String,
    pub students: Vec<StudentRecord>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Empty record for a freshly assigned id
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            ..Self::default()
        }
    }

    /// Check the fields required before any persistence attempt
    pub fn validate(&self) -> SyncResult<()> {
        if self.event_name.trim().is_empty() {
            return Err(SyncError::validation(
                "eventName",
                "Event Name and Date are required",
            ));
        }
        if self.event_date.trim().is_empty() {
            return Err(SyncError::validation(
                "eventDate",
                "Event Name and Date are required",
            ));
        }
        Ok(())
    }

    /// Number of accompanying teachers: comma-separated, blank segments ignored
    pub fn teacher_count(&self) -> usize {
        split_names(&self.accompanying).count()
    }

    /// Students that will actually be persisted, normalized
    pub fn persisted_students(&self) -> Vec<StudentRecord> {
        self.students
            .iter()
            .filter(|student| !student.is_placeholder())
            .map(StudentRecord::normalized)
            .collect()
    }

    /// Copy as it would be persisted: placeholder rows dropped, conditional fields cleared
    pub fn normalized(&self) -> Self {
        Self {
            students: self.persisted_students(),
            ..self.clone()
        }
    }

    /// Equality on the persisted projection; `last_modified` is ignored
    pub fn content_eq(&self, other: &EventRecord) -> bool {
        let mut left = self.normalized();
        let mut right = other.normalized();
        left.last_modified = None;
        right.last_modified = None;
        left == right
    }

    /// No header content and no named students
    pub fn is_blank(&self) -> bool {
        [
            &self.event_name,
            &self.event_date,
            &self.venue,
            &self.departure_time,
            &self.return_time,
            &self.vehicle,
            &self.company,
            &self.accompanying,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
            && self.students.iter().all(StudentRecord::is_placeholder)
    }

    /// Roster counters shown under the student table
    pub fn summary(&self) -> RosterSummary {
        let named = self.students.iter().filter(|s| !s.is_placeholder());
        let mut summary = RosterSummary {
            teacher_count: self.teacher_count(),
            ..RosterSummary::default()
        };
        for student in named {
            summary.total_students += 1;
            if student.present {
                summary.present_count += 1;
            }
            if student.permission {
                summary.permission_count += 1;
            }
        }
        summary.total_people = summary.total_students + summary.teacher_count;
        summary
    }

    /// Picker entry for this event
    pub fn to_summary(&self) -> EventSummary {
        EventSummary {
            event_id: self.event_id.clone(),
            event_name: self.event_name.clone(),
            event_date: self.event_date.clone(),
            last_modified: self.last_modified,
        }
    }
}

/// Headcount derived from a roster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub total_students: usize,
    pub teacher_count: usize,
    pub present_count: usize,
    pub permission_count: usize,
    pub total_people: usize,
}

/// Enough of an event to render the picker
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSummary {
    pub event_id: EventId,
    #[serde(deserialize_with = "lenient::string")]
    pub event_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub event_date: String,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Most recently modified first; events without a timestamp go last
pub fn sort_by_recency(events: &mut [EventSummary]) {
    events.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
}
