//! Engine stand-in that validates and counts records without resolving them.
//!
//! Useful for smoke-testing a pipeline or deliberately draining a queue. Records
//! it accepts are deleted from the queue without ever being resolved, so it is
//! only built when the configuration opts in with `dry_run`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use super::errors::ProcessingError;
use super::RecordProcessor;
use crate::config::{ConfigResult, ConfigurationError, ConsumerConfig};

#[derive(Debug)]
pub struct DryRunEngine {
    instance_name: String,
    configuration: Value,
    debug_trace: bool,
    started_at: DateTime<Utc>,
    records_added: AtomicU64,
    per_data_source: Mutex<BTreeMap<String, u64>>,
}

impl DryRunEngine {
    pub fn new(instance_name: impl Into<String>, configuration: Value, debug_trace: bool) -> Self {
        Self {
            instance_name: instance_name.into(),
            configuration,
            debug_trace,
            started_at: Utc::now(),
            records_added: AtomicU64::new(0),
            per_data_source: Mutex::new(BTreeMap::new()),
        }
    }

    /// Engine for a loaded configuration; refuses unless `dry_run` is set
    pub fn from_config(
        instance_name: impl Into<String>,
        config: &ConsumerConfig,
    ) -> ConfigResult<Self> {
        if !config.dry_run {
            return Err(ConfigurationError::engine_unavailable(
                "this build does not link an entity resolution engine; pass --dry-run \
                 (or set SENZING_DRY_RUN=true) to acknowledge records without resolving them",
            ));
        }
        Ok(Self::new(
            instance_name,
            config.engine_configuration()?,
            config.debug_trace,
        ))
    }

    pub fn records_added(&self) -> u64 {
        self.records_added.load(Ordering::Relaxed)
    }

    pub fn configuration(&self) -> &Value {
        &self.configuration
    }
}

impl RecordProcessor for DryRunEngine {
    fn add_record(
        &self,
        data_source: &str,
        record_id: &str,
        raw_record: &str,
        with_info: bool,
    ) -> Result<Option<String>, ProcessingError> {
        if self.debug_trace {
            trace!(
                instance = %self.instance_name,
                data_source,
                record_id,
                bytes = raw_record.len(),
                "add_record"
            );
        }

        self.records_added.fetch_add(1, Ordering::Relaxed);
        *self
            .per_data_source
            .lock()
            .entry(data_source.to_string())
            .or_insert(0) += 1;

        if !with_info {
            return Ok(None);
        }
        let info = json!({
            "DATA_SOURCE": data_source,
            "RECORD_ID": record_id,
            "AFFECTED_ENTITIES": [],
            "INTERESTING_ENTITIES": { "ENTITIES": [] },
        });
        Ok(Some(info.to_string()))
    }

    fn stats(&self) -> Result<String, ProcessingError> {
        let stats = json!({
            "workload": {
                "instance": self.instance_name,
                "startedAt": self.started_at.to_rfc3339(),
                "addedRecords": self.records_added(),
                "dataSources": *self.per_data_source.lock(),
            }
        });
        Ok(stats.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_records_per_data_source() {
        let engine = DryRunEngine::new("test", json!({}), false);
        engine.add_record("CUSTOMERS", "1", "{}", false).unwrap();
        engine.add_record("CUSTOMERS", "2", "{}", false).unwrap();
        engine.add_record("WATCHLIST", "1", "{}", false).unwrap();

        assert_eq!(engine.records_added(), 3);
        let stats: Value = serde_json::from_str(&engine.stats().unwrap()).unwrap();
        assert_eq!(stats["workload"]["addedRecords"], 3);
        assert_eq!(stats["workload"]["dataSources"]["CUSTOMERS"], 2);
    }

    fn loaded_config(dry_run: bool) -> ConsumerConfig {
        ConsumerConfig {
            sqs_queue_url: Some("https://sqs.us-east-1.amazonaws.com/123456789012/records".into()),
            engine_configuration_json: Some(r#"{"PIPELINE":{"CONFIGPATH":"/etc/opt"}}"#.into()),
            debug_trace: true,
            dry_run,
            ..Default::default()
        }
    }

    #[test]
    fn test_refuses_to_run_without_dry_run_opt_in() {
        let err = DryRunEngine::from_config("test", &loaded_config(false)).unwrap_err();
        assert!(matches!(err, ConfigurationError::EngineUnavailable { .. }));
        assert!(err.to_string().contains("--dry-run"), "{err}");
    }

    #[test]
    fn test_built_from_config_when_opted_in() {
        let engine = DryRunEngine::from_config("test", &loaded_config(true)).unwrap();
        assert_eq!(engine.configuration()["PIPELINE"]["CONFIGPATH"], "/etc/opt");
        assert_eq!(engine.records_added(), 0);
    }

    #[test]
    fn test_with_info_document() {
        let engine = DryRunEngine::new("test", json!({}), true);
        let info = engine
            .add_record("CUSTOMERS", "1001", "{}", true)
            .unwrap()
            .unwrap();
        let info: Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["RECORD_ID"], "1001");
        assert!(info["AFFECTED_ENTITIES"].as_array().unwrap().is_empty());
    }
}
