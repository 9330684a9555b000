//! # Sync Metrics
//!
//! Counters for remote writes, published with every status update.
//!
//! ## Features
//!
//! - **Write Timing**: last and average round trip of a remote write
//! - **Error Tracking**: transient and permanent failures, local rejections
//! - **Payload Size**: bytes of event JSON submitted

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct SyncMetrics {
    /// Remote writes started
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    /// Failures worth retrying (network, backend down, half-written roster)
    pub transient_failures: u64,
    /// Saves stopped before the network for missing required fields
    pub local_rejections: u64,
    pub total_bytes_synced: u64,
    pub last_sync_duration: Option<Duration>,
    total_sync_time: Duration,
    write_started: Option<Instant>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sync_start(&mut self) {
        self.write_started = Some(Instant::now());
        self.total_syncs += 1;
    }

    pub fn record_sync_success(&mut self, bytes_synced: u64) {
        self.successful_syncs += 1;
        self.total_bytes_synced += bytes_synced;
        if let Some(started) = self.write_started.take() {
            let took = started.elapsed();
            self.last_sync_duration = Some(took);
            self.total_sync_time += took;
        }
    }

    pub fn record_sync_failure(&mut self, transient: bool) {
        self.write_started = None;
        self.failed_syncs += 1;
        if transient {
            self.transient_failures += 1;
        }
    }

    pub fn record_local_rejection(&mut self) {
        self.local_rejections += 1;
    }

    /// Mean duration of successful writes
    pub fn average_sync_duration(&self) -> Duration {
        match u32::try_from(self.successful_syncs) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.total_sync_time / count,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_syncs == 0 {
            0.0
        } else {
            self.successful_syncs as f64 / self.total_syncs as f64
        }
    }
}
