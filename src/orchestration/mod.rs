//! # Orchestration
//!
//! The consumer's scheduling and lease-management core.
//!
//! ## Core Components
//!
//! - **Consumer**: the control loop; fetches, submits, harvests, sweeps and drives shutdown
//! - **InFlightRegistry**: every submitted task with its message, start time and extension count
//! - **Lease extension**: visibility window arithmetic for long-running records
//! - **RateCounter**: rolling throughput telemetry
//!
//! ## Cycle
//!
//! 1. Harvest: wait up to the harvest timeout for a completion, acknowledge successes
//! 2. Sweep: when the sweep interval has elapsed, extend leases of tasks past the
//!    long-record threshold and log engine statistics
//! 3. Fetch: consult the governor, then receive messages until the pool is full or
//!    the queue is empty
//!
//! The sweep interval is half the long-record threshold and the initial lease is
//! twice the threshold, so a task is always swept at least once before its first
//! lease can run out.

pub mod consumer;
pub mod lease;
pub mod registry;
pub mod state;
pub mod throughput;

pub use consumer::Consumer;
pub use lease::{next_visibility_window, plan_extensions, LeaseExtension};
pub use registry::{InFlightRegistry, InFlightTask};
pub use state::{ConsumerState, ConsumerSummary, OutstandingTask, ShutdownReason, ShutdownReport};
pub use throughput::{RateCounter, ThroughputReport};
