//! # SQS Record Consumer
//!
//! Pulls records from an SQS queue and hands them to a record engine.
//!
//! This build links no entity resolution engine. It only runs with `--dry-run`
//! (or `SENZING_DRY_RUN=true`), where records are validated, counted and deleted
//! without being resolved; without it the binary exits with a configuration error
//! before touching the queue.
//!
//! Configuration comes from `SENZING_*` environment variables, an optional TOML
//! file and the flags below. SIGINT/SIGTERM drain the in-flight records and exit 0;
//! any fatal error exits non-zero.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use record_consumer::config::{CliOverrides, ConfigLoader};
use record_consumer::engine::DryRunEngine;
use record_consumer::logging::init_structured_logging;
use record_consumer::messaging::{SqsQueueClient, SqsResultSink};
use record_consumer::orchestration::Consumer;
use record_consumer::resilience::NoopGovernor;

#[derive(Parser)]
#[command(name = "sqs-record-consumer")]
#[command(about = "Load records from an SQS queue into the entity resolution engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// SQS queue URL (overrides SENZING_SQS_QUEUE_URL)
    #[arg(short, long)]
    queue: Option<String>,

    /// Return extended results for every record
    #[arg(short, long)]
    info: bool,

    /// Enable engine debug tracing
    #[arg(short = 't', long)]
    debug_trace: bool,

    /// Validate and delete records without resolving them
    #[arg(long)]
    dry_run: bool,

    /// TOML configuration file (overrides SENZING_SQS_CONSUMER_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err:#}");
            1
        }
    };
    // Engine calls still running at this point were abandoned; do not wait for them.
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = CliOverrides {
        queue_url: cli.queue,
        with_info: cli.info,
        debug_trace: cli.debug_trace,
        dry_run: cli.dry_run,
        config_file: cli.config,
    };
    let config = ConfigLoader::new()
        .load(&overrides)
        .context("Invalid consumer configuration")?;

    init_structured_logging(&config.logging()).context("Failed to initialize logging")?;

    let settings = config.consumer_settings()?;
    let queue_url = config.queue_url()?.to_string();
    let engine = DryRunEngine::from_config("sqs-record-consumer", &config)?;
    warn!("🧪 Dry run: records are deleted from the queue without being resolved");

    let queue = SqsQueueClient::from_env(&queue_url, config.max_visibility_seconds).await;
    let sdk_client = queue.sdk_client().clone();

    let mut consumer = Consumer::new(settings, queue, Arc::new(engine), NoopGovernor)?;
    if let Some(info_queue_url) = config.info_queue_url.as_deref() {
        info!(info_queue_url, "Publishing extended results to SQS");
        consumer = consumer.with_sink(SqsResultSink::new(sdk_client, info_queue_url));
    }

    let cancel = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(cancel.clone()));

    let summary = consumer
        .run(cancel)
        .await
        .context("Consumer stopped on a fatal error")?;
    if summary.abandoned > 0 {
        warn!(abandoned = summary.abandoned, "Exiting with records still in flight");
    }
    Ok(())
}

async fn watch_for_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("🛑 Shutdown signal received");
    cancel.cancel();
}
