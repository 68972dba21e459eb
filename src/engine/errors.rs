//! Processing error types raised by record tasks.

use thiserror::Error;

/// Failure of a single record task
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Record is not valid JSON: {message}")]
    Decode { message: String },

    #[error("Record is missing required field {field}")]
    MissingField { field: String },

    #[error("Engine rejected record: {message}")]
    Engine { message: String },

    #[error("Record task panicked: {message}")]
    Panicked { message: String },

    #[error("Record task was cancelled before completing")]
    Cancelled,

    #[error("No finished result for task {task}")]
    UnknownTask { task: String },
}

impl ProcessingError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    pub fn unknown_task(task: impl ToString) -> Self {
        Self::UnknownTask {
            task: task.to_string(),
        }
    }

    /// Whether the record itself was unreadable, as opposed to the engine failing on it
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::MissingField { .. })
    }
}
