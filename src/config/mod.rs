//! # Consumer Configuration
//!
//! Layered configuration for the SQS record consumer. Values come from built-in
//! defaults, an optional TOML file, `SENZING_*` environment variables and finally
//! command-line overrides (see [`loader::ConfigLoader`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use record_consumer::config::{ConfigLoader, CliOverrides};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load(&CliOverrides::default())?;
//! let settings = config.consumer_settings()?;
//! println!("workers: {}", settings.workers);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{CliOverrides, ConfigLoader};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings consumed by [`crate::logging::init_structured_logging`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Raw, deserialized consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// URL of the queue records are pulled from
    pub sqs_queue_url: Option<String>,
    /// JSON document handed to the engine at initialization
    pub engine_configuration_json: Option<String>,
    /// Worker count; defaults to `min(32, cpus + 4)`
    pub threads_per_process: Option<usize>,
    /// Ask the engine for extended (with-info) results
    pub with_info: bool,
    /// Verbose engine tracing
    pub debug_trace: bool,
    /// Validate and acknowledge records without resolving them
    pub dry_run: bool,
    /// Runtime after which a record is long running, in seconds
    pub long_record_seconds: u64,
    /// Records between throughput log lines
    pub throughput_interval: u64,
    pub harvest_timeout_ms: u64,
    pub throttle_backoff_ms: u64,
    pub empty_queue_backoff_ms: u64,
    pub receive_wait_seconds: u64,
    /// Ceiling the queue accepts for a visibility timeout
    pub max_visibility_seconds: u64,
    pub shutdown_grace_seconds: u64,
    /// Optional queue extended results are published to
    pub info_queue_url: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            sqs_queue_url: None,
            engine_configuration_json: None,
            threads_per_process: None,
            with_info: false,
            debug_trace: false,
            dry_run: false,
            long_record_seconds: constants::DEFAULT_LONG_RECORD_SECONDS,
            throughput_interval: constants::DEFAULT_THROUGHPUT_INTERVAL,
            harvest_timeout_ms: constants::DEFAULT_HARVEST_TIMEOUT.as_millis() as u64,
            throttle_backoff_ms: constants::DEFAULT_THROTTLE_BACKOFF.as_millis() as u64,
            empty_queue_backoff_ms: constants::DEFAULT_EMPTY_QUEUE_BACKOFF.as_millis() as u64,
            receive_wait_seconds: 0,
            max_visibility_seconds: constants::sqs::MAX_VISIBILITY_TIMEOUT_SECONDS,
            shutdown_grace_seconds: constants::DEFAULT_SHUTDOWN_GRACE.as_secs(),
            info_queue_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ConsumerConfig {
    /// Queue URL, or a configuration error naming where to set it
    pub fn queue_url(&self) -> ConfigResult<&str> {
        non_empty(self.sqs_queue_url.as_deref()).ok_or_else(|| {
            ConfigurationError::missing_required_field(
                "sqs_queue_url",
                "pass --queue or set SENZING_SQS_QUEUE_URL",
            )
        })
    }

    /// Engine configuration parsed as a JSON object
    pub fn engine_configuration(&self) -> ConfigResult<serde_json::Value> {
        let raw = non_empty(self.engine_configuration_json.as_deref()).ok_or_else(|| {
            ConfigurationError::missing_required_field(
                "engine_configuration_json",
                "set SENZING_ENGINE_CONFIGURATION_JSON to the engine's JSON configuration",
            )
        })?;

        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ConfigurationError::invalid_engine_configuration(e.to_string()))?;
        if !value.is_object() {
            return Err(ConfigurationError::invalid_engine_configuration(
                "expected a JSON object",
            ));
        }
        Ok(value)
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.threads_per_process
            .unwrap_or_else(constants::default_worker_count)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }

    /// Validate every required field and derived limit
    pub fn validate(&self) -> ConfigResult<()> {
        self.queue_url()?;
        self.engine_configuration()?;

        if self.throughput_interval == 0 {
            return Err(ConfigurationError::invalid_value(
                "throughput_interval",
                "0",
                "must be at least 1",
            ));
        }

        if self.receive_wait_seconds > constants::sqs::MAX_RECEIVE_WAIT_SECONDS {
            return Err(ConfigurationError::invalid_value(
                "receive_wait_seconds",
                self.receive_wait_seconds.to_string(),
                format!(
                    "queue accepts at most {}s",
                    constants::sqs::MAX_RECEIVE_WAIT_SECONDS
                ),
            ));
        }

        self.consumer_settings()?;
        Ok(())
    }

    /// Runtime settings for the orchestrator, validated
    pub fn consumer_settings(&self) -> ConfigResult<ConsumerSettings> {
        if self.long_record_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "long_record_seconds",
                "0",
                "must be at least 1 second",
            ));
        }

        let base_visibility_seconds = self.long_record_seconds.saturating_mul(2);
        if base_visibility_seconds > self.max_visibility_seconds {
            return Err(ConfigurationError::invalid_value(
                "long_record_seconds",
                self.long_record_seconds.to_string(),
                format!(
                    "base visibility window of {base_visibility_seconds}s exceeds the {}s limit",
                    self.max_visibility_seconds
                ),
            ));
        }

        let long_record = Duration::from_secs(self.long_record_seconds);
        let settings = ConsumerSettings {
            workers: self.worker_count(),
            with_info: self.with_info,
            long_record,
            base_visibility: long_record * 2,
            sweep_interval: long_record / 2,
            harvest_timeout: Duration::from_millis(self.harvest_timeout_ms),
            throttle_backoff: Duration::from_millis(self.throttle_backoff_ms),
            empty_queue_backoff: Duration::from_millis(self.empty_queue_backoff_ms),
            receive_wait: Duration::from_secs(self.receive_wait_seconds),
            throughput_interval: self.throughput_interval.max(1),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_seconds),
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Timing and sizing the consumer loop runs with
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerSettings {
    /// Worker pool capacity; also the in-flight ceiling
    pub workers: usize,
    pub with_info: bool,
    /// Runtime after which a task's lease gets extended
    pub long_record: Duration,
    /// Visibility timeout requested when a message is received
    pub base_visibility: Duration,
    /// Cadence of the lease extension sweep
    pub sweep_interval: Duration,
    pub harvest_timeout: Duration,
    pub throttle_backoff: Duration,
    pub empty_queue_backoff: Duration,
    pub receive_wait: Duration,
    pub throughput_interval: u64,
    pub shutdown_grace: Duration,
}

impl ConsumerSettings {
    /// Settings for a given worker count and long-record threshold, other values default
    pub fn new(workers: usize, long_record: Duration) -> Self {
        Self {
            workers,
            with_info: false,
            long_record,
            base_visibility: long_record * 2,
            sweep_interval: long_record / 2,
            harvest_timeout: constants::DEFAULT_HARVEST_TIMEOUT.min(long_record / 4),
            throttle_backoff: constants::DEFAULT_THROTTLE_BACKOFF,
            empty_queue_backoff: constants::DEFAULT_EMPTY_QUEUE_BACKOFF,
            receive_wait: Duration::ZERO,
            throughput_interval: constants::DEFAULT_THROUGHPUT_INTERVAL,
            shutdown_grace: constants::DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == 0 {
            return Err(ConfigurationError::invalid_value(
                "threads_per_process",
                "0",
                "at least one worker is required",
            ));
        }

        // An unextended lease must see at least one sweep before it lapses.
        if self.sweep_interval.is_zero() || self.sweep_interval * 2 >= self.base_visibility {
            return Err(ConfigurationError::invalid_value(
                "sweep_interval",
                format!("{:?}", self.sweep_interval),
                format!(
                    "must be non-zero and below half the {:?} visibility window",
                    self.base_visibility
                ),
            ));
        }

        // Every wait inside one loop cycle is shorter than the sweep interval, so
        // sweeps run on schedule even while the loop is blocked harvesting or receiving.
        for (field, wait) in [
            ("harvest_timeout", self.harvest_timeout),
            ("receive_wait", self.receive_wait),
        ] {
            if wait >= self.sweep_interval {
                return Err(ConfigurationError::invalid_value(
                    field,
                    format!("{wait:?}"),
                    format!(
                        "must be shorter than the {:?} sweep interval (half the long-record threshold)",
                        self.sweep_interval
                    ),
                ));
            }
        }

        Ok(())
    }
}
