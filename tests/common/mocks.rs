//! In-memory stand-ins for the queue, the engine, the governor and the result sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use record_consumer::engine::{ProcessingError, RecordProcessor};
use record_consumer::messaging::{
    DeadLetterTarget, MessagingError, QueueClient, QueueMessage, RecordIdentity, ResultSink,
};
use record_consumer::resilience::{Governor, ThrottleDecision};

pub fn record_body(data_source: &str, record_id: &str) -> String {
    serde_json::json!({ "DATA_SOURCE": data_source, "RECORD_ID": record_id, "NAME_FULL": "Test Person" })
        .to_string()
}

/// Message id the in-memory queue assigns to a record
pub fn message_id(record_id: &str) -> String {
    format!("msg-{record_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Received { message_id: String, visibility: Duration },
    ReceiveEmpty,
    Deleted { message_id: String },
    Extended { message_id: String, timeout: Duration },
}

/// Queue holding messages in memory and logging every call made against it
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    events: Mutex<Vec<(Instant, QueueEvent)>>,
    dead_letter: Option<DeadLetterTarget>,
    fail_deletes: AtomicBool,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<'a>(records: impl IntoIterator<Item = &'a str>) -> Self {
        let queue = Self::new();
        for record_id in records {
            queue.push_record("TEST", record_id);
        }
        queue
    }

    pub fn with_dead_letter(mut self, target: DeadLetterTarget) -> Self {
        self.dead_letter = Some(target);
        self
    }

    pub fn push_record(&self, data_source: &str, record_id: &str) {
        self.pending.lock().push_back(QueueMessage::new(
            message_id(record_id),
            format!("receipt-{record_id}"),
            record_body(data_source, record_id),
        ));
    }

    /// Enqueue a message with an arbitrary body
    pub fn push_raw(&self, id: &str, body: &str) {
        self.pending.lock().push_back(QueueMessage::new(
            id,
            format!("receipt-{id}"),
            body,
        ));
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Every event with the instant it happened
    pub fn timed_events(&self) -> Vec<(Instant, QueueEvent)> {
        self.events.lock().clone()
    }

    /// Instant of the first event matching `predicate`
    pub fn first_at(&self, predicate: impl Fn(&QueueEvent) -> bool) -> Option<Instant> {
        self.events
            .lock()
            .iter()
            .find(|(_, e)| predicate(e))
            .map(|(at, _)| *at)
    }

    pub fn received(&self) -> usize {
        self.count(|e| matches!(e, QueueEvent::Received { .. }))
    }

    pub fn empty_receives(&self) -> usize {
        self.count(|e| matches!(e, QueueEvent::ReceiveEmpty))
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, e)| match e {
                QueueEvent::Deleted { message_id } => Some(message_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn extensions_for(&self, id: &str) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, e)| match e {
                QueueEvent::Extended {
                    message_id,
                    timeout,
                } if message_id == id => Some(*timeout),
                _ => None,
            })
            .collect()
    }

    /// Position of the first event matching `predicate`
    pub fn position(&self, predicate: impl Fn(&QueueEvent) -> bool) -> Option<usize> {
        self.events.lock().iter().position(|(_, e)| predicate(e))
    }

    fn count(&self, predicate: impl Fn(&QueueEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|(_, e)| predicate(e)).count()
    }

    fn record(&self, event: QueueEvent) {
        self.events.lock().push((Instant::now(), event));
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    fn queue_url(&self) -> &str {
        "memory://records"
    }

    async fn receive(
        &self,
        visibility_timeout: Duration,
        _wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError> {
        let next = self.pending.lock().pop_front();
        let event = match &next {
            Some(message) => QueueEvent::Received {
                message_id: message.message_id.clone(),
                visibility: visibility_timeout,
            },
            None => QueueEvent::ReceiveEmpty,
        };
        self.record(event);
        Ok(next)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), MessagingError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MessagingError::queue_operation(
                self.queue_url(),
                "delete_message",
                "access denied",
            ));
        }
        self.record(QueueEvent::Deleted {
            message_id: message.message_id.clone(),
        });
        Ok(())
    }

    async fn extend_visibility(
        &self,
        message: &QueueMessage,
        timeout: Duration,
    ) -> Result<(), MessagingError> {
        self.record(QueueEvent::Extended {
            message_id: message.message_id.clone(),
            timeout,
        });
        Ok(())
    }

    async fn resolve_dead_letter_target(&self) -> Result<Option<DeadLetterTarget>, MessagingError> {
        Ok(self.dead_letter.clone())
    }
}

/// Engine whose per-record latency and failures are scripted by record id
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    active: AtomicUsize,
    peak: AtomicUsize,
    completed: Mutex<Vec<String>>,
    stats_calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, record_id: &str, delay: Duration) -> Self {
        self.delays.insert(record_id.to_string(), delay);
        self
    }

    pub fn failing(mut self, record_id: &str) -> Self {
        self.failures.insert(record_id.to_string());
        self
    }

    /// Highest number of simultaneous `add_record` calls seen
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

impl RecordProcessor for ScriptedEngine {
    fn add_record(
        &self,
        data_source: &str,
        record_id: &str,
        _raw_record: &str,
        with_info: bool,
    ) -> Result<Option<String>, ProcessingError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(record_id) {
            std::thread::sleep(*delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(record_id) {
            return Err(ProcessingError::engine(format!("{record_id} rejected")));
        }
        self.completed.lock().push(record_id.to_string());

        Ok(with_info.then(|| {
            serde_json::json!({ "DATA_SOURCE": data_source, "RECORD_ID": record_id, "AFFECTED_ENTITIES": [] })
                .to_string()
        }))
    }

    fn stats(&self) -> Result<String, ProcessingError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"workload":{}}"#.to_string())
    }
}

/// Governor replaying scripted decisions, then repeating a fallback
#[derive(Debug)]
pub struct ScriptedGovernor {
    script: VecDeque<ThrottleDecision>,
    fallback: ThrottleDecision,
    calls: Arc<AtomicUsize>,
    decisions: Arc<Mutex<Vec<(Instant, ThrottleDecision)>>>,
}

impl ScriptedGovernor {
    pub fn always(decision: ThrottleDecision) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: decision,
            calls: Arc::new(AtomicUsize::new(0)),
            decisions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn then_always(
        script: impl IntoIterator<Item = ThrottleDecision>,
        fallback: ThrottleDecision,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::always(fallback)
        }
    }

    /// Shared counter of `govern` calls, readable after the governor moved into a consumer
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared log of every decision handed out and when
    pub fn decisions(&self) -> Arc<Mutex<Vec<(Instant, ThrottleDecision)>>> {
        Arc::clone(&self.decisions)
    }
}

#[async_trait]
impl Governor for ScriptedGovernor {
    async fn govern(&mut self) -> ThrottleDecision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let decision = self.script.pop_front().unwrap_or(self.fallback);
        self.decisions.lock().push((Instant::now(), decision));
        decision
    }
}

/// Sink keeping every published payload
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    published: Arc<Mutex<Vec<(RecordIdentity, String)>>>,
}

impl RecordingSink {
    pub fn published(&self) -> Vec<(RecordIdentity, String)> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn publish(
        &self,
        identity: &RecordIdentity,
        payload: String,
    ) -> Result<(), MessagingError> {
        self.published.lock().push((identity.clone(), payload));
        Ok(())
    }
}
