//! # Retry Logic and Backoff Strategies
//!
//! Backoff for failed remote writes. The scheduler keeps one
//! [`RetryTracker`] per engine: every transient failure asks it for the next
//! delay until the attempt budget runs out, after which automatic retries
//! stop until an edit or a manual sync resets it.
//!
//! ## Features
//!
//! - **Exponential Backoff**: `min(base * 2^attempt, cap)`
//! - **Fixed Interval**: constant delay, mostly for tests
//! - **Max Retries**: attempts beyond the budget give up instead of waiting

use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed {
        /// Delay between attempts
        interval: Duration,
    },
    /// Exponential backoff, capped
    Exponential {
        /// Delay multiplied by `2^attempt`
        base: Duration,
        /// Upper bound for any single delay
        cap: Duration,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(60),
        }
    }
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { interval } => interval,
            Self::Exponential { base, cap } => {
                // 2^31 already overflows any sane base; clamp the exponent first
                let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
                base.checked_mul(factor).unwrap_or(cap).min(cap)
            }
        }
    }
}

/// What to do after a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again
    RetryAfter(Duration),
    /// Budget spent; leave the change pending
    GiveUp,
}

/// Attempt counter for the current pending change
#[derive(Debug, Clone)]
pub struct RetryTracker {
    strategy: BackoffStrategy,
    max_retries: u32,
    attempt: u32,
    exhausted: bool,
}

impl RetryTracker {
    pub fn new(strategy: BackoffStrategy, max_retries: u32) -> Self {
        Self {
            strategy,
            max_retries,
            attempt: 0,
            exhausted: false,
        }
    }

    /// Record a transient failure and decide whether to retry
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempt = self.attempt.saturating_add(1);
        if self.attempt <= self.max_retries {
            RetryDecision::RetryAfter(self.strategy.delay(self.attempt))
        } else {
            self.exhausted = true;
            RetryDecision::GiveUp
        }
    }

    /// Clear the counter after a success, a new edit or a manual sync
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.exhausted = false;
    }

    /// Failures since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether automatic retries have stopped
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
