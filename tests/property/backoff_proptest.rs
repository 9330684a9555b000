//! Property-based tests for retry scheduling

use proptest::prelude::*;
use std::time::Duration;

use eventlog_pro::client::sync::retry::{BackoffStrategy, RetryDecision, RetryTracker};

proptest! {
    #[test]
    fn test_exponential_delays_grow_up_to_cap(
        base_ms in 1u64..5_000,
        cap_secs in 1u64..600,
        attempts in 1u32..40,
    ) {
        let cap = Duration::from_secs(cap_secs);
        let strategy = BackoffStrategy::Exponential {
            base: Duration::from_millis(base_ms),
            cap,
        };

        let mut previous = Duration::ZERO;
        for attempt in 1..=attempts {
            let delay = strategy.delay(attempt);
            prop_assert!(delay >= previous);
            prop_assert!(delay <= cap);
            previous = delay;
        }
    }

    #[test]
    fn test_gives_up_right_after_max_retries(max_retries in 0u32..12) {
        let mut tracker = RetryTracker::new(BackoffStrategy::default(), max_retries);

        for attempt in 1..=max_retries {
            let decision = tracker.record_failure();
            prop_assert!(matches!(decision, RetryDecision::RetryAfter(_)));
            prop_assert_eq!(tracker.attempt(), attempt);
            prop_assert!(!tracker.is_exhausted());
        }
        prop_assert_eq!(tracker.record_failure(), RetryDecision::GiveUp);
        prop_assert!(tracker.is_exhausted());

        tracker.reset();
        prop_assert_eq!(tracker.attempt(), 0);
        prop_assert!(!tracker.is_exhausted());
    }
}
