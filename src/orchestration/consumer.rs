//! # Consumer Loop
//!
//! The single-threaded orchestrator. Each cycle it harvests completed tasks,
//! sweeps long-running leases when the sweep interval has elapsed, consults the
//! governor and then fills the worker pool from the queue. It never runs record
//! processing itself.
//!
//! No wait inside a cycle (harvest, backoff, governor pause, receive) runs past
//! the next sweep, so an unextended lease of `2 * long_record` is always swept at
//! least once after the record crosses the long-record threshold.
//!
//! A message is deleted only after its task succeeded (and its extended result,
//! if any, was published). Any error other than an empty receive stops the loop:
//! the outstanding work is reported, the pool is shut down and the error is
//! returned to the caller.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::lease::plan_extensions;
use super::registry::InFlightRegistry;
use super::state::{ConsumerState, ConsumerSummary, OutstandingTask, ShutdownReason, ShutdownReport};
use super::throughput::RateCounter;
use crate::config::ConsumerSettings;
use crate::engine::RecordProcessor;
use crate::error::{ConsumerError, Result};
use crate::execution::{TaskHandle, WorkerPool};
use crate::messaging::{LogSink, QueueClient, ResultSink};
use crate::resilience::{FetchGate, GateOutcome, Governor};

pub struct Consumer<Q, P, G>
where
    Q: QueueClient,
    P: RecordProcessor,
    G: Governor,
{
    consumer_id: Uuid,
    settings: ConsumerSettings,
    queue: Q,
    engine: Arc<P>,
    governor: G,
    sink: Box<dyn ResultSink>,
    pool: WorkerPool<P>,
    registry: InFlightRegistry,
    rate: RateCounter,
    gate: FetchGate,
    state: ConsumerState,
    last_sweep_at: Instant,
    /// End of a governor pause; fetching resumes once it passes
    resume_fetch_at: Option<Instant>,
    shutdown_report: Option<ShutdownReport>,
}

impl<Q, P, G> Consumer<Q, P, G>
where
    Q: QueueClient,
    P: RecordProcessor,
    G: Governor,
{
    pub fn new(settings: ConsumerSettings, queue: Q, engine: Arc<P>, governor: G) -> Result<Self> {
        settings.validate()?;

        let now = Instant::now();
        Ok(Self {
            consumer_id: Uuid::new_v4(),
            pool: WorkerPool::new(Arc::clone(&engine), settings.workers),
            rate: RateCounter::new(settings.throughput_interval, now),
            gate: FetchGate::new(settings.throttle_backoff),
            settings,
            queue,
            engine,
            governor,
            sink: Box::new(LogSink),
            registry: InFlightRegistry::new(),
            state: ConsumerState::default(),
            last_sweep_at: now,
            resume_fetch_at: None,
            shutdown_report: None,
        })
    }

    /// Send extended results somewhere other than the log
    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn consumer_id(&self) -> Uuid {
        self.consumer_id
    }

    pub fn settings(&self) -> &ConsumerSettings {
        &self.settings
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Records processed and acknowledged so far
    pub fn processed(&self) -> u64 {
        self.rate.total()
    }

    pub fn in_flight(&self) -> usize {
        self.registry.count()
    }

    /// Report of the last shutdown, once [`Consumer::run`] has returned
    pub fn shutdown_report(&self) -> Option<&ShutdownReport> {
        self.shutdown_report.as_ref()
    }

    /// Run until `cancel` fires or a fatal error occurs.
    ///
    /// Cancellation stops fetching, lets outstanding tasks finish and be
    /// acknowledged within the shutdown grace period, and returns a summary.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<ConsumerSummary> {
        info!(
            consumer_id = %self.consumer_id,
            queue_url = self.queue.queue_url(),
            "🚀 CONSUMER: Threads: {}",
            self.pool.capacity()
        );

        match self.consume(&cancel).await {
            Ok(()) => {
                let report = self.stop(ShutdownReason::Cancelled, Duration::ZERO).await;
                let summary = ConsumerSummary {
                    processed: self.processed(),
                    abandoned: report.abandoned,
                };
                info!(
                    consumer_id = %self.consumer_id,
                    processed = summary.processed,
                    "✅ CONSUMER: Processed total of {} adds",
                    summary.processed
                );
                Ok(summary)
            }
            Err(err) => {
                error!(
                    consumer_id = %self.consumer_id,
                    kind = err.kind(),
                    error = %err,
                    "❌ CONSUMER: Shutting down due to error"
                );
                let reason = ShutdownReason::Fatal {
                    kind: err.kind(),
                    message: err.to_string(),
                };
                self.stop(reason, self.settings.shutdown_grace).await;
                info!(
                    consumer_id = %self.consumer_id,
                    processed = self.processed(),
                    "❌ CONSUMER: Processed total of {} adds",
                    self.processed()
                );
                Err(err)
            }
        }
    }

    async fn consume(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.report_dead_letter_target().await?;
        self.run_loop(cancel).await?;
        self.drain().await
    }

    async fn report_dead_letter_target(&self) -> Result<()> {
        match self.queue.resolve_dead_letter_target().await? {
            Some(target) => info!(
                dead_letter_url = %target.url,
                dead_letter_arn = %target.arn,
                max_receive_count = ?target.max_receive_count,
                "📤 CONSUMER: Dead letter queue is {}",
                target.url
            ),
            None => warn!(
                queue_url = self.queue.queue_url(),
                "⚠️ CONSUMER: No dead letter queue configured; failed records will be redelivered indefinitely"
            ),
        }
        Ok(())
    }

    /// Returns `Ok(())` once cancelled; any error is fatal
    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            if !self.registry.is_empty() {
                self.state = ConsumerState::Harvesting;
                let wait = self.capped(self.settings.harvest_timeout);
                let completed = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    completed = self.pool.poll_completed(wait) => completed,
                };
                for handle in completed {
                    self.acknowledge(handle).await?;
                }
            }

            let now = Instant::now();
            if now.saturating_duration_since(self.last_sweep_at) >= self.settings.sweep_interval {
                self.state = ConsumerState::Sweeping;
                self.last_sweep_at = now;
                self.sweep(now).await?;
            }

            self.state = ConsumerState::Fetching;
            self.fetch(cancel).await?;
        }
    }

    /// Time left until the next sweep is due
    fn until_next_sweep(&self) -> Duration {
        (self.last_sweep_at + self.settings.sweep_interval).saturating_duration_since(Instant::now())
    }

    /// `wait` shortened so it ends no later than the next sweep
    fn capped(&self, wait: Duration) -> Duration {
        wait.min(self.until_next_sweep())
    }

    /// Collect a completed task and acknowledge its message on success
    async fn acknowledge(&mut self, handle: TaskHandle) -> Result<()> {
        let task = self.registry.deregister(handle).ok_or_else(|| {
            ConsumerError::internal(format!("completed task {handle} is not in flight"))
        })?;

        let payload = self
            .pool
            .result_of(handle)
            .map_err(|source| ConsumerError::processing(task.message.identity.clone(), source))?;

        if let Some(payload) = payload {
            self.sink.publish(task.identity(), payload).await?;
        }
        self.queue.delete(&task.message).await?;

        debug!(
            message_id = %task.message.message_id,
            record = %task.identity(),
            "Record processed and acknowledged"
        );

        if let Some(report) = self.rate.record_success(Instant::now()) {
            match report.records_per_second {
                Some(rate) => info!(
                    processed = report.processed,
                    records_per_second = rate,
                    window_seconds = report.window.as_secs_f64(),
                    "Processed {} adds, {} records per second",
                    report.processed,
                    rate
                ),
                None => info!(
                    processed = report.processed,
                    window_seconds = report.window.as_secs_f64(),
                    "Processed {} adds",
                    report.processed
                ),
            }
        }
        Ok(())
    }

    async fn sweep(&mut self, now: Instant) -> Result<()> {
        match self.engine.stats() {
            Ok(stats) => info!(stats = %stats, "Engine statistics"),
            Err(e) => warn!(error = %e, "Engine statistics unavailable"),
        }

        let threshold = self.settings.long_record;
        let due = plan_extensions(&self.registry, now, threshold);
        for extension in &due {
            let Some(task) = self.registry.get(extension.handle) else {
                continue;
            };
            let identity = task.identity().clone();
            self.queue
                .extend_visibility(&task.message, extension.window)
                .await?;

            let extensions = self
                .registry
                .record_extension(extension.handle, extension.window, now)
                .unwrap_or(extension.extensions + 1);
            let elapsed_minutes = extension.elapsed.as_secs_f64() / 60.0;
            warn!(
                elapsed_minutes,
                extensions,
                window_seconds = extension.window.as_secs(),
                data_source = identity.data_source_or_unknown(),
                record_id = identity.record_id_or_unknown(),
                "Extended visibility ({elapsed_minutes:.3} min, extended {extensions}): {identity}"
            );
        }

        let capacity = self.pool.capacity();
        if due.len() >= capacity {
            warn!(
                workers = capacity,
                "All {} threads are stuck on long running records",
                capacity
            );
        }
        Ok(())
    }

    async fn fetch(&mut self, cancel: &CancellationToken) -> Result<()> {
        let capacity = self.pool.capacity();

        if self.resume_fetch_at.is_none() {
            let decision = self.governor.govern().await;
            match self.gate.evaluate(decision, self.registry.count(), capacity) {
                GateOutcome::Halted(backoff) => {
                    debug!(?backoff, "Governor halted ingestion");
                    pause(self.capped(backoff), cancel).await;
                    return Ok(());
                }
                GateOutcome::Saturated(backoff) => {
                    debug!(in_flight = self.registry.count(), "All workers busy");
                    pause(self.capped(backoff), cancel).await;
                    return Ok(());
                }
                GateOutcome::PauseThenFetch(delay) => {
                    debug!(?delay, "Governor paused ingestion");
                    self.resume_fetch_at = Some(Instant::now() + delay);
                }
                GateOutcome::Fetch => {}
            }
        }

        // A governor pause longer than the sweep interval is spread over several
        // cycles; the governor is asked again only after it has run out.
        if let Some(resume_at) = self.resume_fetch_at {
            pause(self.capped(resume_at.saturating_duration_since(Instant::now())), cancel).await;
            if Instant::now() < resume_at {
                return Ok(());
            }
            self.resume_fetch_at = None;
        }

        while self.registry.count() < capacity && !cancel.is_cancelled() {
            let received = self
                .queue
                .receive(self.settings.base_visibility, self.capped(self.settings.receive_wait))
                .await?;

            let Some(message) = received else {
                if self.registry.is_empty() {
                    pause(self.capped(self.settings.empty_queue_backoff), cancel).await;
                }
                break;
            };

            let handle = self.pool.submit(&message, self.settings.with_info)?;
            debug!(
                task = %handle,
                message_id = %message.message_id,
                record = %message.identity,
                redelivered = message.is_redelivery(),
                "Record submitted"
            );
            self.registry.register(
                handle,
                message,
                Instant::now(),
                self.settings.base_visibility,
            );
        }
        Ok(())
    }

    /// Keep harvesting after cancellation until the grace period runs out
    async fn drain(&mut self) -> Result<()> {
        self.state = ConsumerState::ShuttingDown;
        if self.registry.is_empty() {
            return Ok(());
        }

        info!(
            in_flight = self.registry.count(),
            grace_seconds = self.settings.shutdown_grace.as_secs(),
            "🛑 CONSUMER: Shutdown requested, draining in-flight records"
        );
        let deadline = Instant::now() + self.settings.shutdown_grace;
        while !self.registry.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let completed = self
                .pool
                .poll_completed(remaining.min(self.settings.harvest_timeout))
                .await;
            for handle in completed {
                self.acknowledge(handle).await?;
            }
        }
        Ok(())
    }

    /// Report what is still running, shut the pool down and keep the report
    async fn stop(&mut self, reason: ShutdownReason, grace: Duration) -> ShutdownReport {
        self.state = ConsumerState::ShuttingDown;

        let now = Instant::now();
        let outstanding: Vec<OutstandingTask> = self
            .registry
            .oldest_first()
            .into_iter()
            .filter(|task| !self.pool.is_finished(task.handle))
            .map(|task| OutstandingTask {
                message_id: task.message.message_id.clone(),
                identity: task.identity().clone(),
                elapsed: task.elapsed(now),
                extensions: task.extensions,
            })
            .collect();

        for task in &outstanding {
            let elapsed_minutes = task.elapsed.as_secs_f64() / 60.0;
            warn!(
                message_id = %task.message_id,
                elapsed_minutes,
                extensions = task.extensions,
                data_source = task.identity.data_source_or_unknown(),
                record_id = task.identity.record_id_or_unknown(),
                "Still processing ({elapsed_minutes:.3} min: {})",
                task.identity
            );
        }

        let abandoned = self.pool.shutdown(grace).await;
        let report = ShutdownReport {
            reason,
            outstanding,
            abandoned,
        };
        self.shutdown_report = Some(report.clone());
        report
    }
}

/// Sleep unless cancelled first
async fn pause(duration: Duration, cancel: &CancellationToken) {
    if duration.is_zero() {
        return;
    }
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(duration) => {}
    }
}
