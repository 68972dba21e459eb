//! Destinations for extended (with-info) engine results.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use tracing::{debug, info};

use super::errors::MessagingError;
use super::message::RecordIdentity;

/// Receives the extended payload of every successfully processed record.
///
/// Called by the orchestrator before the originating message is acknowledged, so
/// a failed publish leaves the message on the queue for redelivery.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, identity: &RecordIdentity, payload: String)
        -> Result<(), MessagingError>;
}

/// Writes payloads to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn publish(
        &self,
        identity: &RecordIdentity,
        payload: String,
    ) -> Result<(), MessagingError> {
        info!(record = %identity, payload = %payload, "Extended result");
        Ok(())
    }
}

/// Publishes payloads to a secondary SQS queue
#[derive(Debug, Clone)]
pub struct SqsResultSink {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsResultSink {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl ResultSink for SqsResultSink {
    async fn publish(
        &self,
        identity: &RecordIdentity,
        payload: String,
    ) -> Result<(), MessagingError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(payload)
            .send()
            .await
            .map_err(|e| {
                MessagingError::publish(&self.queue_url, DisplayErrorContext(e).to_string())
            })?;

        debug!(
            record = %identity,
            info_message_id = output.message_id().unwrap_or_default(),
            "Extended result published"
        );
        Ok(())
    }
}
