//! # Messaging Module
//!
//! Queue access for the consumer: the [`QueueClient`] seam the orchestrator talks to,
//! the SQS implementation behind it, dead-letter resolution and the sinks that
//! receive extended engine results.

pub mod errors;
pub mod message;
pub mod redrive;
pub mod sink;
pub mod sqs_client;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use errors::MessagingError;
pub use message::{QueueMessage, RecordIdentity};
pub use redrive::{DeadLetterTarget, QueueArn};
pub use sink::{LogSink, ResultSink, SqsResultSink};
pub use sqs_client::SqsQueueClient;

/// Operations the consumer needs from a remote queue.
///
/// Only the orchestrator calls these, so implementations are never hit by more
/// than one caller at a time; they still have to be `Send + Sync` to live inside
/// the spawned consumer task.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Locator of the queue this client consumes
    fn queue_url(&self) -> &str;

    /// Receive at most one message, hiding it for `visibility_timeout`.
    ///
    /// `Ok(None)` means the queue had nothing to hand out within `wait`.
    async fn receive(
        &self,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError>;

    /// Acknowledge a message
    async fn delete(&self, message: &QueueMessage) -> Result<(), MessagingError>;

    /// Hide a message for `timeout` from now; fails past the client's maximum
    async fn extend_visibility(
        &self,
        message: &QueueMessage,
        timeout: Duration,
    ) -> Result<(), MessagingError>;

    /// Dead-letter queue configured on the source queue, if any
    async fn resolve_dead_letter_target(&self) -> Result<Option<DeadLetterTarget>, MessagingError>;
}

#[async_trait]
impl<T: QueueClient + ?Sized> QueueClient for Arc<T> {
    fn queue_url(&self) -> &str {
        (**self).queue_url()
    }

    async fn receive(
        &self,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError> {
        (**self).receive(visibility_timeout, wait).await
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), MessagingError> {
        (**self).delete(message).await
    }

    async fn extend_visibility(
        &self,
        message: &QueueMessage,
        timeout: Duration,
    ) -> Result<(), MessagingError> {
        (**self).extend_visibility(message, timeout).await
    }

    async fn resolve_dead_letter_target(&self) -> Result<Option<DeadLetterTarget>, MessagingError> {
        (**self).resolve_dead_letter_target().await
    }
}

/// Whole seconds for the queue API, rounding partial seconds up
pub fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::ZERO), 0);
        assert_eq!(whole_seconds(Duration::from_secs(600)), 600);
        assert_eq!(whole_seconds(Duration::from_millis(1)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
    }
}
