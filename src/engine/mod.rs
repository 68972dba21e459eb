//! # Record Processing Engine Adapter
//!
//! The consumer hands every record to an entity resolution engine through the
//! [`RecordProcessor`] trait. Engine calls are synchronous and may block for a long
//! time, so the worker pool runs them on blocking threads; implementations must be
//! safe for as many simultaneous callers as there are workers.

pub mod dry_run;
pub mod envelope;
pub mod errors;

pub use dry_run::DryRunEngine;
pub use envelope::RecordEnvelope;
pub use errors::ProcessingError;

/// Call contract of the entity resolution engine
pub trait RecordProcessor: Send + Sync + 'static {
    /// Add (or replace) one record.
    ///
    /// When `with_info` is set the engine may return its extended result document.
    fn add_record(
        &self,
        data_source: &str,
        record_id: &str,
        raw_record: &str,
        with_info: bool,
    ) -> Result<Option<String>, ProcessingError>;

    /// Engine-wide statistics snapshot, as a JSON document
    fn stats(&self) -> Result<String, ProcessingError>;
}

/// Decode a message body and feed it to the engine.
///
/// Returns the extended result only when `with_info` is requested. Decode and
/// engine failures are returned as-is; nothing is retried here.
pub fn process_record<P>(
    processor: &P,
    body: &str,
    with_info: bool,
) -> Result<Option<String>, ProcessingError>
where
    P: RecordProcessor + ?Sized,
{
    let envelope = RecordEnvelope::decode(body)?;
    let info = processor.add_record(&envelope.data_source, &envelope.record_id, body, with_info)?;
    Ok(info.filter(|_| with_info))
}
