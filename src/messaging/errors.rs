//! # Messaging Error Types
//!
//! Structured errors for queue operations. A queue error is never retried at this
//! layer: it surfaces at the call site and takes the consumer down.

use thiserror::Error;

/// Messaging error types
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Queue operation failed: {queue_url}: {operation}: {message}")]
    QueueOperation {
        queue_url: String,
        operation: String,
        message: String,
    },

    #[error("Visibility timeout of {requested_seconds}s exceeds the queue limit of {limit_seconds}s")]
    VisibilityLimitExceeded {
        requested_seconds: u64,
        limit_seconds: u64,
    },

    #[error("Message {message_id} has no receipt handle")]
    MissingReceiptHandle { message_id: String },

    #[error("Invalid redrive policy: {message}")]
    RedrivePolicy { message: String },

    #[error("Failed to publish extended result to {queue_url}: {message}")]
    Publish { queue_url: String, message: String },
}

impl MessagingError {
    /// Create a queue operation error
    pub fn queue_operation(
        queue_url: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_url: queue_url.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a visibility limit error
    pub fn visibility_limit_exceeded(requested_seconds: u64, limit_seconds: u64) -> Self {
        Self::VisibilityLimitExceeded {
            requested_seconds,
            limit_seconds,
        }
    }

    /// Create a missing receipt handle error
    pub fn missing_receipt_handle(message_id: impl Into<String>) -> Self {
        Self::MissingReceiptHandle {
            message_id: message_id.into(),
        }
    }

    /// Create a redrive policy error
    pub fn redrive_policy(message: impl Into<String>) -> Self {
        Self::RedrivePolicy {
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(queue_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            queue_url: queue_url.into(),
            message: message.into(),
        }
    }
}
