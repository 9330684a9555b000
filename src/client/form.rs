//! # Roster Form Model
//!
//! In-memory state of the event form: header fields, roster rows and the
//! search filter. `capture_snapshot` projects it into an [`EventRecord`]
//! without side effects; the filter only affects which rows the UI shows,
//! never what gets captured.

use crate::shared::event::{EventId, EventRecord, RosterSummary};
use crate::shared::student::{Illness, StudentRecord};

/// Editable header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    EventName,
    EventDate,
    Venue,
    DepartureTime,
    ReturnTime,
    Vehicle,
    Company,
    Accompanying,
}

/// Editable roster form
#[derive(Debug, Clone)]
pub struct RosterForm {
    event_id: EventId,
    event_name: String,
    event_date: String,
    venue: String,
    departure_time: String,
    return_time: String,
    vehicle: String,
    company: String,
    accompanying: String,
    rows: Vec<StudentRecord>,
    filter: String,
    loaded: bool,
}

impl Default for RosterForm {
    fn default() -> Self {
        Self::new(EventId::default())
    }
}

impl RosterForm {
    /// Blank form with one empty row
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event_name: String::new(),
            event_date: String::new(),
            venue: String::new(),
            departure_time: String::new(),
            return_time: String::new(),
            vehicle: String::new(),
            company: String::new(),
            accompanying: String::new(),
            rows: vec![StudentRecord::default()],
            filter: String::new(),
            loaded: false,
        }
    }

    /// Project the form into a record. Every row is included; conditional
    /// fields are cleared when their switch is off.
    pub fn capture_snapshot(&self) -> EventRecord {
        EventRecord {
            event_id: self.event_id.clone(),
            event_name: self.event_name.clone(),
            event_date: self.event_date.clone(),
            venue: self.venue.clone(),
            departure_time: self.departure_time.clone(),
            return_time: self.return_time.clone(),
            vehicle: self.vehicle.clone(),
            company: self.company.clone(),
            accompanying: self.accompanying.clone(),
            students: self.rows.iter().map(StudentRecord::normalized).collect(),
            last_modified: None,
        }
    }

    /// Replace the form contents with `record`
    pub fn load_record(&mut self, record: &EventRecord) {
        self.event_id = record.event_id.clone();
        self.event_name = record.event_name.clone();
        self.event_date = record.event_date.clone();
        self.venue = record.venue.clone();
        self.departure_time = record.departure_time.clone();
        self.return_time = record.return_time.clone();
        self.vehicle = record.vehicle.clone();
        self.company = record.company.clone();
        self.accompanying = record.accompanying.clone();
        self.rows = record.students.clone();
        if self.rows.is_empty() {
            self.rows.push(StudentRecord::default());
        }
        self.filter.clear();
        self.loaded = true;
    }

    /// Clear everything and start over under `event_id`
    pub fn reset(&mut self, event_id: EventId) {
        *self = Self::new(event_id);
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Whether an existing event (or a recovered draft) is in the form
    pub fn has_loaded_event(&self) -> bool {
        self.loaded
    }

    pub fn field(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::EventName => &self.event_name,
            HeaderField::EventDate => &self.event_date,
            HeaderField::Venue => &self.venue,
            HeaderField::DepartureTime => &self.departure_time,
            HeaderField::ReturnTime => &self.return_time,
            HeaderField::Vehicle => &self.vehicle,
            HeaderField::Company => &self.company,
            HeaderField::Accompanying => &self.accompanying,
        }
    }

    pub fn set_field(&mut self, field: HeaderField, value: impl Into<String>) {
        let slot = match field {
            HeaderField::EventName => &mut self.event_name,
            HeaderField::EventDate => &mut self.event_date,
            HeaderField::Venue => &mut self.venue,
            HeaderField::DepartureTime => &mut self.departure_time,
            HeaderField::ReturnTime => &mut self.return_time,
            HeaderField::Vehicle => &mut self.vehicle,
            HeaderField::Company => &mut self.company,
            HeaderField::Accompanying => &mut self.accompanying,
        };
        *slot = value.into();
    }

    pub fn rows(&self) -> &[StudentRecord] {
        &self.rows
    }

    /// Append a blank row and return its index
    pub fn add_row(&mut self) -> usize {
        self.rows.push(StudentRecord::default());
        self.rows.len() - 1
    }

    /// Append a filled-in row and return its index
    pub fn push_student(&mut self, student: StudentRecord) -> usize {
        self.rows.push(student);
        self.rows.len() - 1
    }

    /// Remove a row. The last remaining row is never removed.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    /// Edit a row in place; returns false when the index is out of range
    pub fn update_row(&mut self, index: usize, edit: impl FnOnce(&mut StudentRecord)) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                edit(row);
                true
            }
            None => false,
        }
    }

    /// Change a row's illness; the free-text description is dropped unless `Other`
    pub fn set_illness(&mut self, index: usize, illness: Illness) -> bool {
        self.update_row(index, |row| {
            row.illness = illness;
            if illness != Illness::Other {
                row.other_illness.clear();
            }
        })
    }

    /// Toggle medication; unchecking drops the details
    pub fn set_taking_medication(&mut self, index: usize, taking: bool) -> bool {
        self.update_row(index, |row| {
            row.taking_medication = taking;
            if !taking {
                row.medication_details.clear();
            }
        })
    }

    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.filter = query.into();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    /// Indices of rows matching the search filter (name, form or contact,
    /// case-insensitive). All rows when the filter is blank.
    pub fn visible_rows(&self) -> Vec<usize> {
        let needle = self.filter.trim().to_lowercase();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || [&row.name, &row.form, &row.contact]
                        .iter()
                        .any(|value| value.to_lowercase().contains(&needle))
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub fn summary(&self) -> RosterSummary {
        self.capture_snapshot().summary()
    }
}
