//! # SQS Queue Client
//!
//! [`QueueClient`] backed by `aws-sdk-sqs`. Credentials and region come from the
//! standard AWS provider chain.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName, QueueAttributeName};
use std::time::Duration;
use tracing::{debug, info};

use super::errors::MessagingError;
use super::message::QueueMessage;
use super::redrive::DeadLetterTarget;
use super::{whole_seconds, QueueClient};
use crate::constants::sqs;

/// SQS client bound to one source queue
#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
    queue_url: String,
    max_visibility_seconds: u64,
}

impl SqsQueueClient {
    /// Create a client from the ambient AWS configuration
    pub async fn from_env(queue_url: impl Into<String>, max_visibility_seconds: u64) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = aws_sdk_sqs::Client::new(&sdk_config);
        Self::new(client, queue_url, max_visibility_seconds)
    }

    /// Create a client around an existing SDK client (shares its connection pool)
    pub fn new(
        client: aws_sdk_sqs::Client,
        queue_url: impl Into<String>,
        max_visibility_seconds: u64,
    ) -> Self {
        let queue_url = queue_url.into();
        info!(
            queue_url = %queue_url,
            max_visibility_seconds,
            "SQS queue client created"
        );
        Self {
            client,
            queue_url,
            max_visibility_seconds: max_visibility_seconds
                .min(sqs::MAX_VISIBILITY_TIMEOUT_SECONDS),
        }
    }

    /// Underlying SDK client, for sinks that publish to other queues
    pub fn sdk_client(&self) -> &aws_sdk_sqs::Client {
        &self.client
    }

    pub fn max_visibility_seconds(&self) -> u64 {
        self.max_visibility_seconds
    }

    fn operation_error<E>(&self, operation: &str, err: E) -> MessagingError
    where
        E: std::error::Error,
    {
        MessagingError::queue_operation(
            &self.queue_url,
            operation,
            DisplayErrorContext(err).to_string(),
        )
    }

    fn convert(message: Message) -> Result<QueueMessage, MessagingError> {
        let message_id = message.message_id().unwrap_or("unknown").to_string();
        let receipt_handle = message
            .receipt_handle()
            .ok_or_else(|| MessagingError::missing_receipt_handle(&message_id))?
            .to_string();
        let receive_count = message
            .attributes()
            .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
            .and_then(|count| count.parse().ok());

        Ok(QueueMessage::new(
            message_id,
            receipt_handle,
            message.body().unwrap_or_default(),
        )
        .with_receive_count(receive_count))
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    fn queue_url(&self) -> &str {
        &self.queue_url
    }

    async fn receive(
        &self,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(sqs::RECEIVE_BATCH_SIZE)
            .visibility_timeout(whole_seconds(visibility_timeout) as i32)
            .wait_time_seconds(
                whole_seconds(wait).min(sqs::MAX_RECEIVE_WAIT_SECONDS) as i32,
            )
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| self.operation_error("receive_message", e))?;

        let Some(message) = output.messages.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let message = Self::convert(message)?;
        debug!(
            message_id = %message.message_id,
            record = %message.identity,
            receive_count = message.receive_count,
            "Received message"
        );
        Ok(Some(message))
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), MessagingError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt_handle)
            .send()
            .await
            .map_err(|e| self.operation_error("delete_message", e))?;

        debug!(message_id = %message.message_id, "Message deleted");
        Ok(())
    }

    async fn extend_visibility(
        &self,
        message: &QueueMessage,
        timeout: Duration,
    ) -> Result<(), MessagingError> {
        let seconds = whole_seconds(timeout);
        if seconds > self.max_visibility_seconds {
            return Err(MessagingError::visibility_limit_exceeded(
                seconds,
                self.max_visibility_seconds,
            ));
        }

        self.client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt_handle)
            .visibility_timeout(seconds as i32)
            .send()
            .await
            .map_err(|e| self.operation_error("change_message_visibility", e))?;

        debug!(
            message_id = %message.message_id,
            visibility_seconds = seconds,
            "Message visibility extended"
        );
        Ok(())
    }

    async fn resolve_dead_letter_target(&self) -> Result<Option<DeadLetterTarget>, MessagingError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::RedrivePolicy)
            .send()
            .await
            .map_err(|e| self.operation_error("get_queue_attributes", e))?;

        output
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::RedrivePolicy))
            .map(|policy| DeadLetterTarget::from_policy(policy))
            .transpose()
    }
}
