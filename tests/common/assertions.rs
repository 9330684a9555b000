//! Assertion helpers
//!
//! `assert_ok!` / `assert_err!` print the failing `SyncError` in full;
//! the roster helpers compare by student name, in roster order.

use eventlog_pro::shared::EventRecord;

/// Unwrap an `Ok` value or panic with the error
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("operation failed: {:?}", e),
        }
    };
}

/// Assert that a result is an `Err` matching `$pattern`
#[macro_export]
macro_rules! assert_err {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            other => panic!("expected Err({}), got {:?}", stringify!($pattern), other),
        }
    };
}

/// Student names in roster order
pub fn roster_names(record: &EventRecord) -> Vec<&str> {
    record.students.iter().map(|s| s.name.as_str()).collect()
}

/// Assert the roster of `record` is exactly `names`, in order
#[track_caller]
pub fn assert_roster(record: &EventRecord, names: &[&str]) {
    assert_eq!(
        roster_names(record),
        names,
        "roster of {} differs",
        record.event_id
    );
}
