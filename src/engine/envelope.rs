//! Record envelope decoding.

use serde_json::{Map, Value};

use super::errors::ProcessingError;
use crate::constants::fields;
use crate::messaging::RecordIdentity;

/// The fields the engine call needs out of a message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnvelope {
    pub data_source: String,
    pub record_id: String,
}

impl RecordEnvelope {
    /// Decode a raw body; both fields are required, `RECORD_ID` may be numeric
    pub fn decode(body: &str) -> Result<Self, ProcessingError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ProcessingError::decode(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| ProcessingError::decode("record is not a JSON object"))?;

        Ok(Self {
            data_source: required_text(object, fields::DATA_SOURCE)?,
            record_id: required_text(object, fields::RECORD_ID)?,
        })
    }

    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity::new(&self.data_source, &self.record_id)
    }
}

fn required_text(object: &Map<String, Value>, field: &str) -> Result<String, ProcessingError> {
    match object.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => Err(ProcessingError::missing_field(field)),
    }
}
