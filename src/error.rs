//! # Consumer Error Types
//!
//! Top-level error for the consumer. Every variant except an empty receive is fatal
//! to the process; the orchestrator logs it, dumps the in-flight work and exits.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::engine::ProcessingError;
use crate::execution::WorkerPoolError;
use crate::messaging::{MessagingError, RecordIdentity};

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    WorkerPool(#[from] WorkerPoolError),

    #[error("Processing failed for record {identity}: {source}")]
    Processing {
        identity: RecordIdentity,
        #[source]
        source: ProcessingError,
    },

    #[error("Logging initialization failed: {message}")]
    Logging { message: String },

    #[error("Internal consumer error: {message}")]
    Internal { message: String },
}

impl ConsumerError {
    /// Create a processing error bound to the record that raised it
    pub fn processing(identity: RecordIdentity, source: ProcessingError) -> Self {
        Self::Processing { identity, source }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// Whether the error was raised by a record rather than by infrastructure
    pub fn is_processing_failure(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Short error kind used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Messaging(_) => "messaging",
            Self::WorkerPool(_) => "worker_pool",
            Self::Processing { .. } => "processing",
            Self::Logging { .. } => "logging",
            Self::Internal { .. } => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsumerError>;
