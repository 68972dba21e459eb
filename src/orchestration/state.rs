//! Consumer loop states and the reports produced when the loop stops.

use std::fmt;
use std::time::Duration;

use crate::messaging::RecordIdentity;

/// Phase of the consumer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsumerState {
    /// Consulting the governor and pulling messages
    #[default]
    Fetching,
    /// Waiting for and acknowledging completed tasks
    Harvesting,
    /// Extending leases of long-running tasks
    Sweeping,
    /// Loop has stopped; draining or abandoning outstanding work
    ShuttingDown,
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Harvesting => "harvesting",
            Self::Sweeping => "sweeping",
            Self::ShuttingDown => "shutting_down",
        };
        f.write_str(name)
    }
}

/// Why the consumer stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// External cancellation; outstanding work was given the grace period
    Cancelled,
    /// A fatal error ended the loop
    Fatal { kind: &'static str, message: String },
}

impl ShutdownReason {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

/// A task that was still running when the consumer stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingTask {
    pub message_id: String,
    pub identity: RecordIdentity,
    pub elapsed: Duration,
    pub extensions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    /// Oldest first
    pub outstanding: Vec<OutstandingTask>,
    /// Tasks detached because they outlived the grace period
    pub abandoned: usize,
}

/// Result of a consumer run that ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerSummary {
    pub processed: u64,
    pub abandoned: usize,
}
