#![allow(dead_code)]

pub mod mocks;
pub mod strategies;

pub use mocks::*;

use record_consumer::config::ConsumerSettings;
use record_consumer::engine::RecordProcessor;
use record_consumer::messaging::QueueClient;
use record_consumer::orchestration::{Consumer, ConsumerSummary};
use record_consumer::resilience::Governor;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Settings with short timings so loop tests finish quickly
pub fn fast_settings(workers: usize, long_record: Duration) -> ConsumerSettings {
    let mut settings = ConsumerSettings::new(workers, long_record);
    settings.harvest_timeout = Duration::from_millis(50);
    settings.throttle_backoff = Duration::from_millis(20);
    settings.empty_queue_backoff = Duration::from_millis(20);
    settings.shutdown_grace = Duration::from_secs(5);
    settings
}

/// Run the consumer until `done` holds (or it stops by itself), then cancel it.
///
/// Gives up waiting after ten seconds so a broken loop fails the test instead of hanging.
pub async fn run_until<Q, P, G>(
    consumer: &mut Consumer<Q, P, G>,
    done: impl Fn() -> bool,
) -> record_consumer::Result<ConsumerSummary>
where
    Q: QueueClient,
    P: RecordProcessor,
    G: Governor,
{
    let cancel = CancellationToken::new();

    let run = async {
        let result = consumer.run(cancel.clone()).await;
        cancel.cancel();
        result
    };
    let watch = async {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done() && !cancel.is_cancelled() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
    };

    let (result, ()) = tokio::join!(run, watch);
    result
}
