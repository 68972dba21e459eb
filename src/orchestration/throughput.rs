//! Rolling throughput telemetry.

use std::time::Duration;
use tokio::time::Instant;

/// Throughput over the last `interval` successful records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputReport {
    pub processed: u64,
    pub window: Duration,
    /// `None` when the window was too short to measure
    pub records_per_second: Option<u64>,
}

/// Counts successful records and reports throughput every `interval` of them
#[derive(Debug, Clone)]
pub struct RateCounter {
    interval: u64,
    total: u64,
    last_checkpoint_at: Instant,
    last_checkpoint_count: u64,
}

impl RateCounter {
    pub fn new(interval: u64, now: Instant) -> Self {
        Self {
            interval: interval.max(1),
            total: 0,
            last_checkpoint_at: now,
            last_checkpoint_count: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Count one success; yields a report whenever the total reaches a multiple of the interval
    pub fn record_success(&mut self, now: Instant) -> Option<ThroughputReport> {
        self.total += 1;
        if self.total % self.interval != 0 {
            return None;
        }

        let window = now.saturating_duration_since(self.last_checkpoint_at);
        let processed_in_window = self.total - self.last_checkpoint_count;
        let records_per_second = (!window.is_zero())
            .then(|| (processed_in_window as f64 / window.as_secs_f64()) as u64);

        self.last_checkpoint_at = now;
        self.last_checkpoint_count = self.total;

        Some(ThroughputReport {
            processed: self.total,
            window,
            records_per_second,
        })
    }
}
