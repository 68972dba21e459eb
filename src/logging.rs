//! # Structured Logging Module
//!
//! Installs the global `tracing` subscriber for the consumer. Every telemetry line
//! the consumer emits (throughput, long-running records, saturation, engine stats,
//! shutdown reports) is a structured `tracing` event routed through here.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{ConsumerError, Result};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process; later calls are no-ops
pub fn init_structured_logging(config: &LoggingConfig) -> Result<()> {
    if LOGGER_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = build_filter(config)?;
    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_filter(filter)
            .boxed(),
    };

    // A subscriber may already be installed by an embedding process or a test harness.
    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized - keeping existing subscriber");
    }

    let _ = LOGGER_INITIALIZED.set(());
    tracing::info!(
        pid = std::process::id(),
        level = %config.level,
        format = ?config.format,
        "Structured logging initialized"
    );
    Ok(())
}

/// `RUST_LOG` wins when present; otherwise the configured level applies
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = directive_for_level(&config.level);
    EnvFilter::try_new(level).map_err(|e| ConsumerError::logging(e.to_string()))
}

/// Map the operator-facing level names (`SENZING_LOG_LEVEL`) onto `tracing` directives
pub fn directive_for_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "notset" | "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warning" | "warn" => "warn",
        "error" | "fatal" | "critical" => "error",
        _ => "info",
    }
}
