//! Property-based tests

pub mod backoff_proptest;
pub mod change_proptest;
pub mod event_proptest;
