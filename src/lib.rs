#![allow(clippy::doc_markdown)] // Allow technical terms like SQS, ARN in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # SQS Record Consumer
//!
//! Bounded-concurrency consumer that pulls records from an SQS queue, loads each
//! one into an entity resolution engine on a worker pool, and deletes the message
//! only after the engine accepted the record.
//!
//! ## Overview
//!
//! The interesting part is the consumer loop in [`orchestration`]: it keeps at most
//! one task per worker in flight, extends the visibility lease of records that run
//! longer than the long-record threshold so the queue does not redeliver them while
//! they are still being processed, lets an external governor pace ingestion, and logs
//! rolling throughput. Everything around it is plumbing behind traits, so the queue,
//! the engine and the governor can each be replaced.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Consumer loop, in-flight registry, lease extension, throughput
//! - [`execution`] - Bounded worker pool running blocking engine calls
//! - [`messaging`] - Queue client seam, SQS implementation, dead-letter resolution, result sinks
//! - [`engine`] - Record processor seam, record decoding, dry-run engine
//! - [`resilience`] - Governor seam and the fetch gate
//! - [`config`] - Layered configuration (defaults, TOML file, environment, CLI)
//! - [`logging`] - Structured logging initialisation
//! - [`error`] - Top-level error type
//!
//! ## Failure Model
//!
//! Every error except an empty receive is fatal. The consumer logs it with the
//! offending record's identity, reports the records still in flight, shuts the pool
//! down and returns the error. Unacknowledged messages become visible again when
//! their lease runs out and eventually move to the dead-letter queue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use record_consumer::config::ConsumerSettings;
//! use record_consumer::engine::DryRunEngine;
//! use record_consumer::messaging::SqsQueueClient;
//! use record_consumer::orchestration::Consumer;
//! use record_consumer::resilience::NoopGovernor;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> record_consumer::Result<()> {
//! let settings = ConsumerSettings::new(8, Duration::from_secs(300));
//! let queue_url = "https://sqs.us-east-1.amazonaws.com/123456789012/records";
//! let queue = SqsQueueClient::from_env(queue_url, 43_200).await;
//! let engine = Arc::new(DryRunEngine::new("loader", serde_json::json!({}), false));
//!
//! let mut consumer = Consumer::new(settings, queue, engine, NoopGovernor)?;
//! let summary = consumer.run(CancellationToken::new()).await?;
//! println!("processed {} records", summary.processed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod execution;
pub mod logging;
pub mod messaging;
pub mod orchestration;
pub mod resilience;

pub use config::{ConsumerConfig, ConsumerSettings};
pub use engine::{ProcessingError, RecordProcessor};
pub use error::{ConsumerError, Result};
pub use execution::{TaskHandle, WorkerPool};
pub use messaging::{QueueClient, QueueMessage, RecordIdentity};
pub use orchestration::{Consumer, ConsumerState, ConsumerSummary, ShutdownReport};
pub use resilience::{Governor, ThrottleDecision};
