//! Configuration Loader
//!
//! Layers configuration sources with the `config` crate, lowest precedence first:
//! built-in defaults, an optional TOML file, `SENZING_*` environment variables
//! (plus the legacy `LONG_RECORD`), and command-line overrides.

use config::{Config, Environment, File, FileFormat, Map};
use std::path::PathBuf;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::ConsumerConfig;
use crate::constants::env;

/// Values supplied on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub queue_url: Option<String>,
    pub with_info: bool,
    pub debug_trace: bool,
    pub dry_run: bool,
    pub config_file: Option<PathBuf>,
}

/// Builds a validated [`ConsumerConfig`] from layered sources
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Replaces the process environment when set (used by tests)
    environment: Option<Map<String, String>>,
}

impl ConfigLoader {
    /// Loader reading the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader reading the given variables instead of the process environment
    pub fn with_environment<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            environment: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Load, merge and validate the configuration
    pub fn load(&self, cli: &CliOverrides) -> ConfigResult<ConsumerConfig> {
        let config = self.load_unvalidated(cli)?;
        config.validate()?;

        debug!(
            queue_url = config.sqs_queue_url.as_deref().unwrap_or_default(),
            workers = config.worker_count(),
            long_record_seconds = config.long_record_seconds,
            with_info = config.with_info,
            dry_run = config.dry_run,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load and merge without validating required fields
    pub fn load_unvalidated(&self, cli: &CliOverrides) -> ConfigResult<ConsumerConfig> {
        let mut builder = Config::builder();

        if let Some(path) = self.config_file(cli) {
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(env::ENV_PREFIX)
                .try_parsing(true)
                .source(self.environment.clone()),
        );

        if let Some(raw) = self.var(env::LONG_RECORD) {
            let seconds: u64 = raw.trim().parse().map_err(|_| {
                ConfigurationError::invalid_value(
                    env::LONG_RECORD,
                    raw.clone(),
                    "expected a whole number of seconds",
                )
            })?;
            builder = builder.set_override("long_record_seconds", seconds.to_string())?;
        }

        if let Some(queue_url) = &cli.queue_url {
            builder = builder.set_override("sqs_queue_url", queue_url.clone())?;
        }
        if cli.with_info {
            builder = builder.set_override("with_info", true)?;
        }
        if cli.debug_trace {
            builder = builder.set_override("debug_trace", true)?;
        }
        if cli.dry_run {
            builder = builder.set_override("dry_run", true)?;
        }

        Ok(builder.build()?.try_deserialize::<ConsumerConfig>()?)
    }

    fn config_file(&self, cli: &CliOverrides) -> Option<PathBuf> {
        cli.config_file
            .clone()
            .or_else(|| self.var(env::CONFIG_FILE).map(PathBuf::from))
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.environment {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }
}
