//! # Queue Message Structures
//!
//! A received message and the record identity estimated from its body. The
//! identity only feeds diagnostics; decoding for processing happens in the
//! engine adapter, where a malformed body is an error.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::engine::RecordEnvelope;

/// Data source and record id of a message, as far as they could be read
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RecordIdentity {
    pub data_source: Option<String>,
    pub record_id: Option<String>,
}

impl RecordIdentity {
    pub fn new(data_source: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            data_source: Some(data_source.into()),
            record_id: Some(record_id.into()),
        }
    }

    /// Identity of a body that could not be decoded
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Best-effort identity of a raw message body
    pub fn estimate(body: &str) -> Self {
        RecordEnvelope::decode(body)
            .map(|envelope| envelope.identity())
            .unwrap_or_default()
    }

    pub fn is_known(&self) -> bool {
        self.data_source.is_some() || self.record_id.is_some()
    }

    pub fn data_source_or_unknown(&self) -> &str {
        self.data_source.as_deref().unwrap_or("unknown")
    }

    pub fn record_id_or_unknown(&self) -> &str {
        self.record_id.as_deref().unwrap_or("unknown")
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return write!(f, "unknown");
        }
        write!(
            f,
            "{} : {}",
            self.data_source_or_unknown(),
            self.record_id_or_unknown()
        )
    }
}

/// A message received from the queue; immutable once received
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub message_id: String,
    /// Lease handle; required for delete and visibility changes
    pub receipt_handle: String,
    pub body: String,
    pub identity: RecordIdentity,
    pub received_at: DateTime<Utc>,
    /// How many times the queue has handed this message out, when reported
    pub receive_count: Option<u32>,
}

impl QueueMessage {
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        Self {
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            identity: RecordIdentity::estimate(&body),
            body,
            received_at: Utc::now(),
            receive_count: None,
        }
    }

    pub fn with_receive_count(mut self, receive_count: Option<u32>) -> Self {
        self.receive_count = receive_count;
        self
    }

    /// Whether the queue delivered this message before
    pub fn is_redelivery(&self) -> bool {
        self.receive_count.is_some_and(|count| count > 1)
    }
}
