//! # Change Detection
//!
//! Compares a captured record against the last confirmed one. Both sides
//! are normalized before comparison: rows without a name are dropped,
//! conditional fields are cleared, `last_modified` is ignored. Roster order
//! matters.

use crate::shared::event::EventRecord;

#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    baseline: Option<EventRecord>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_baseline(record: EventRecord) -> Self {
        let mut detector = Self::new();
        detector.accept(&record);
        detector
    }

    /// Whether `record` differs from the baseline.
    ///
    /// Without a baseline any record with content is a change.
    pub fn has_changes(&self, record: &EventRecord) -> bool {
        match &self.baseline {
            Some(baseline) => !baseline.content_eq(record),
            None => !record.is_blank(),
        }
    }

    /// Record `record` as the confirmed state
    pub fn accept(&mut self, record: &EventRecord) {
        let mut baseline = record.normalized();
        baseline.last_modified = None;
        self.baseline = Some(baseline);
    }

    pub fn baseline(&self) -> Option<&EventRecord> {
        self.baseline.as_ref()
    }

    pub fn clear(&mut self) {
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::event::EventId;
    use crate::shared::student::{Illness, StudentRecord};

    fn record() -> EventRecord {
        EventRecord {
            event_id: EventId::new(2024, 1),
            event_name: "Zoo".into(),
            event_date: "2024-05-01".into(),
            students: vec![StudentRecord::named("Ana"), StudentRecord::named("Ben")],
            ..EventRecord::default()
        }
    }

    #[test]
    fn test_no_baseline() {
        let detector = ChangeDetector::new();
        assert!(detector.has_changes(&record()));
        assert!(!detector.has_changes(&EventRecord::default()));
    }

    #[test]
    fn test_exclusion_rules() {
        let detector = ChangeDetector::with_baseline(record());
        let mut edited = record();
        edited.students.push(StudentRecord::named(""));
        edited.students[0].medication_details = "ignored while unchecked".into();
        edited.students[1].illness = Illness::None;
        edited.students[1].other_illness = "ignored unless Other".into();
        assert!(!detector.has_changes(&edited));
    }

    #[test]
    fn test_roster_order_matters() {
        let detector = ChangeDetector::with_baseline(record());
        let mut reordered = record();
        reordered.students.reverse();
        assert!(detector.has_changes(&reordered));
    }

    #[test]
    fn test_header_edit_is_a_change() {
        let mut detector = ChangeDetector::with_baseline(record());
        let mut edited = record();
        edited.venue = "City Zoo".into();
        assert!(detector.has_changes(&edited));

        detector.accept(&edited);
        assert!(!detector.has_changes(&edited));
    }
}
