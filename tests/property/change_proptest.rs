//! Property-based tests for change detection
//!
//! Edits that never reach the backend must not count as changes.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use eventlog_pro::client::sync::change_detector::ChangeDetector;
use eventlog_pro::shared::{EventId, EventRecord, Illness, StudentRecord};

fn illness() -> impl Strategy<Value = Illness> {
    prop::sample::select(Illness::ALL.to_vec())
}

fn student() -> impl Strategy<Value = StudentRecord> {
    (
        "[A-Z][a-z]{1,8}",
        "[0-9][A-C]",
        illness(),
        "[a-z ]{0,12}",
        any::<bool>(),
        "[a-z ]{0,12}",
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(name, form, illness, other, medication, details, permission, present)| {
                StudentRecord {
                    name,
                    form,
                    illness,
                    other_illness: other,
                    taking_medication: medication,
                    medication_details: details,
                    permission,
                    present,
                    ..StudentRecord::default()
                }
            },
        )
}

fn record() -> impl Strategy<Value = EventRecord> {
    (
        1u32..999,
        "[A-Za-z ]{1,20}",
        "[A-Za-z, ]{0,30}",
        prop::collection::vec(student(), 0..6),
    )
        .prop_map(|(sequence, name, accompanying, students)| EventRecord {
            event_id: EventId::new(2024, sequence),
            event_name: name,
            event_date: "2024-05-01".to_string(),
            accompanying,
            students,
            ..EventRecord::default()
        })
}

proptest! {
    #[test]
    fn test_placeholder_rows_are_not_changes(
        base in record(),
        at in 0usize..8,
        blank in "[ ]{0,3}",
    ) {
        let detector = ChangeDetector::with_baseline(base.clone());
        let mut edited = base;
        let index = at.min(edited.students.len());
        edited.students.insert(index, StudentRecord {
            name: blank,
            form: "9Z".to_string(),
            ..StudentRecord::default()
        });
        prop_assert!(!detector.has_changes(&edited));
    }

    #[test]
    fn test_last_modified_is_not_a_change(base in record(), secs in 0i64..2_000_000_000) {
        let detector = ChangeDetector::with_baseline(base.clone());
        let mut edited = base;
        edited.last_modified = Utc.timestamp_opt(secs, 0).single();
        prop_assert!(!detector.has_changes(&edited));
    }

    #[test]
    fn test_hidden_conditional_fields_are_not_changes(
        base in record(),
        text in "[a-z]{1,10}",
    ) {
        let detector = ChangeDetector::with_baseline(base.clone());
        let mut edited = base;
        for student in &mut edited.students {
            if student.illness != Illness::Other {
                student.other_illness.push_str(&text);
            }
            if !student.taking_medication {
                student.medication_details.push_str(&text);
            }
        }
        prop_assert!(!detector.has_changes(&edited));
    }

    #[test]
    fn test_renaming_a_student_is_a_change(base in record(), suffix in "[a-z]{1,4}") {
        prop_assume!(!base.students.is_empty());
        let detector = ChangeDetector::with_baseline(base.clone());
        let mut edited = base;
        edited.students[0].name.push_str(&suffix);
        prop_assert!(detector.has_changes(&edited));
    }
}
