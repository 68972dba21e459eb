//! Worker Pool for Record Processing
//!
//! Runs engine calls on tokio's blocking threads, at most `capacity` at a time.
//! The pool owns its own completion signalling (a [`JoinSet`]); the orchestrator
//! only submits, polls for completions and collects results.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::{process_record, ProcessingError, RecordProcessor};
use crate::messaging::QueueMessage;

/// Result of one record task: the optional extended payload, or the failure
pub type TaskOutcome = Result<Option<String>, ProcessingError>;

/// Identifies a submitted record task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(Id);

impl TaskHandle {
    pub fn id(&self) -> Id {
        self.0
    }
}

impl From<Id> for TaskHandle {
    fn from(id: Id) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerPoolError {
    #[error("All {capacity} workers are occupied")]
    AtCapacity { capacity: usize },

    #[error("Worker pool has been shut down")]
    ShutDown,
}

/// Bounded pool executing [`process_record`] for submitted messages
pub struct WorkerPool<P: RecordProcessor> {
    processor: Arc<P>,
    capacity: usize,
    running: JoinSet<TaskOutcome>,
    /// Completed tasks whose outcome has not been collected yet
    finished: HashMap<TaskHandle, TaskOutcome>,
    shut_down: bool,
}

impl<P: RecordProcessor> fmt::Debug for WorkerPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("running", &self.running.len())
            .field("finished", &self.finished.len())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl<P: RecordProcessor> WorkerPool<P> {
    pub fn new(processor: Arc<P>, capacity: usize) -> Self {
        Self {
            processor,
            capacity: capacity.max(1),
            running: JoinSet::new(),
            finished: HashMap::new(),
            shut_down: false,
        }
    }

    /// Maximum number of tasks the pool holds at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks still executing
    pub fn active_count(&self) -> usize {
        self.running.len()
    }

    /// Tasks executing or finished but not yet collected
    pub fn occupied(&self) -> usize {
        self.running.len() + self.finished.len()
    }

    pub fn has_spare_capacity(&self) -> bool {
        self.occupied() < self.capacity
    }

    /// Whether a task has completed and is waiting for [`WorkerPool::result_of`]
    pub fn is_finished(&self, handle: TaskHandle) -> bool {
        self.finished.contains_key(&handle)
    }

    /// Start processing a message on a worker
    pub fn submit(
        &mut self,
        message: &QueueMessage,
        with_info: bool,
    ) -> Result<TaskHandle, WorkerPoolError> {
        if self.shut_down {
            return Err(WorkerPoolError::ShutDown);
        }
        if !self.has_spare_capacity() {
            return Err(WorkerPoolError::AtCapacity {
                capacity: self.capacity,
            });
        }

        let processor = Arc::clone(&self.processor);
        let body = message.body.clone();
        // A panicking engine call surfaces through the JoinSet as a panicked JoinError.
        let abort_handle = self
            .running
            .spawn_blocking(move || process_record(processor.as_ref(), &body, with_info));

        let handle = TaskHandle(abort_handle.id());
        debug!(task = %handle, message_id = %message.message_id, "Record task submitted");
        Ok(handle)
    }

    /// Wait up to `timeout` for at least one completion, then collect every
    /// completion that is already available.
    pub async fn poll_completed(&mut self, timeout: Duration) -> Vec<TaskHandle> {
        let mut completed = Vec::new();
        if self.running.is_empty() {
            return completed;
        }

        match tokio::time::timeout(timeout, self.running.join_next_with_id()).await {
            Ok(Some(joined)) => completed.push(self.stash(joined)),
            Ok(None) | Err(_) => return completed,
        }

        while let Some(joined) = self.running.try_join_next_with_id() {
            completed.push(self.stash(joined));
        }
        completed
    }

    /// Collect the outcome of a completed task; each outcome is handed out once
    pub fn result_of(&mut self, handle: TaskHandle) -> TaskOutcome {
        self.finished
            .remove(&handle)
            .unwrap_or_else(|| Err(ProcessingError::unknown_task(handle)))
    }

    /// Stop accepting work and give running tasks up to `grace` to finish.
    ///
    /// Engine calls cannot be interrupted, so tasks still running after the grace
    /// period are detached rather than killed. Returns how many were abandoned.
    pub async fn shutdown(&mut self, grace: Duration) -> usize {
        self.shut_down = true;
        let deadline = Instant::now() + grace;

        while !self.running.is_empty() {
            match tokio::time::timeout_at(deadline, self.running.join_next()).await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        let abandoned = self.running.len();
        if abandoned > 0 {
            warn!(abandoned, "Abandoning record tasks still running at shutdown");
            self.running.detach_all();
        }
        self.finished.clear();
        abandoned
    }

    fn stash(&mut self, joined: Result<(Id, TaskOutcome), JoinError>) -> TaskHandle {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome),
            Err(err) => {
                let id = err.id();
                let outcome = if err.is_panic() {
                    Err(ProcessingError::panicked(panic_message(err.into_panic().as_ref())))
                } else {
                    Err(ProcessingError::Cancelled)
                };
                (id, outcome)
            }
        };
        let handle = TaskHandle(id);
        self.finished.insert(handle, outcome);
        handle
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
