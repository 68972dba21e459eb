//! # Execution Module
//!
//! Bounded execution of record tasks. The engine API is blocking, so each record
//! runs on a blocking thread owned by the [`WorkerPool`]; the orchestrator is the
//! only caller and never blocks on an individual task.

pub mod worker_pool;

pub use worker_pool::{TaskHandle, TaskOutcome, WorkerPool, WorkerPoolError};
