//! # Operational Constants
//!
//! Defaults and hard limits that define the operational boundaries of the consumer.
//! Everything here can be overridden through [`crate::config::ConsumerConfig`] except
//! the queue service limits, which are fixed by SQS itself.

use std::time::Duration;

/// Records between two throughput log lines
pub const DEFAULT_THROUGHPUT_INTERVAL: u64 = 10_000;

/// Runtime after which a record is considered long running, in seconds
pub const DEFAULT_LONG_RECORD_SECONDS: u64 = 300;

/// Upper bound on one harvest wait
pub const DEFAULT_HARVEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause applied when the governor halts ingestion or every worker is busy
pub const DEFAULT_THROTTLE_BACKOFF: Duration = Duration::from_secs(1);

/// Pause applied when the queue is empty and nothing is in flight
pub const DEFAULT_EMPTY_QUEUE_BACKOFF: Duration = Duration::from_millis(100);

/// Grace period for in-flight records when the consumer is asked to stop
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Hard cap on the worker count when none is configured
pub const MAX_DEFAULT_WORKERS: usize = 32;

/// Extra workers on top of the CPU count when none is configured
pub const DEFAULT_WORKER_HEADROOM: usize = 4;

/// Environment variables read outside the `SENZING_` prefix scheme
pub mod env {
    pub const LONG_RECORD: &str = "LONG_RECORD";
    pub const CONFIG_FILE: &str = "SENZING_SQS_CONSUMER_CONFIG";
    pub const ENV_PREFIX: &str = "SENZING";
}

/// Limits imposed by the queue service
pub mod sqs {
    /// Maximum visibility timeout SQS accepts, in seconds (12 hours)
    pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u64 = 43_200;

    /// Maximum long-poll wait, in seconds
    pub const MAX_RECEIVE_WAIT_SECONDS: u64 = 20;

    /// Messages requested per receive call
    pub const RECEIVE_BATCH_SIZE: i32 = 1;
}

/// Record envelope field names
pub mod fields {
    pub const DATA_SOURCE: &str = "DATA_SOURCE";
    pub const RECORD_ID: &str = "RECORD_ID";
}

/// Worker count used when the configuration leaves it unset.
///
/// Mirrors the conventional thread-pool default of `min(32, cpus + 4)` so a
/// deployment without explicit tuning still overlaps I/O-bound engine calls.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + DEFAULT_WORKER_HEADROOM).min(MAX_DEFAULT_WORKERS)
}
