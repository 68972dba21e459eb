//! # In-Flight Task Registry
//!
//! Every record task that has been submitted to the worker pool and not yet
//! harvested. Owned and mutated by the orchestrator only.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::execution::TaskHandle;
use crate::messaging::{QueueMessage, RecordIdentity};

/// A submitted task and the lease bookkeeping for its message
#[derive(Debug, Clone)]
pub struct InFlightTask {
    pub handle: TaskHandle,
    pub message: QueueMessage,
    pub submitted_at: Instant,
    /// Lease extensions granted so far
    pub extensions: u32,
    /// When the most recently granted visibility window runs out
    pub lease_expires_at: Instant,
}

impl InFlightTask {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.submitted_at)
    }

    pub fn identity(&self) -> &RecordIdentity {
        &self.message.identity
    }
}

#[derive(Debug, Default)]
pub struct InFlightRegistry {
    tasks: HashMap<TaskHandle, InFlightTask>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a task whose message was received with a `lease` visibility window
    pub fn register(
        &mut self,
        handle: TaskHandle,
        message: QueueMessage,
        now: Instant,
        lease: Duration,
    ) -> &InFlightTask {
        let task = InFlightTask {
            handle,
            message,
            submitted_at: now,
            extensions: 0,
            lease_expires_at: now + lease,
        };
        self.tasks.insert(handle, task);
        &self.tasks[&handle]
    }

    pub fn deregister(&mut self, handle: TaskHandle) -> Option<InFlightTask> {
        self.tasks.remove(&handle)
    }

    pub fn get(&self, handle: TaskHandle) -> Option<&InFlightTask> {
        self.tasks.get(&handle)
    }

    /// Outstanding tasks, oldest first
    pub fn oldest_first(&self) -> Vec<&InFlightTask> {
        let mut tasks: Vec<_> = self.tasks.values().collect();
        tasks.sort_by_key(|task| task.submitted_at);
        tasks
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Note a granted extension; returns the new extension count
    pub fn record_extension(
        &mut self,
        handle: TaskHandle,
        window: Duration,
        now: Instant,
    ) -> Option<u32> {
        let task = self.tasks.get_mut(&handle)?;
        task.extensions += 1;
        task.lease_expires_at = now + window;
        Some(task.extensions)
    }
}
