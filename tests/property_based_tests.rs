mod common;

use common::strategies::*;
use common::message_id;
use proptest::prelude::*;
use record_consumer::execution::TaskHandle;
use record_consumer::messaging::QueueMessage;
use record_consumer::orchestration::{
    next_visibility_window, plan_extensions, InFlightRegistry, RateCounter,
};
use record_consumer::resilience::{FetchGate, GateOutcome, ThrottleDecision};
use std::time::Duration;
use tokio::time::Instant;

fn task_handles(count: usize) -> Vec<TaskHandle> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    (0..count)
        .map(|_| TaskHandle::from(runtime.spawn(async {}).id()))
        .collect()
}

proptest! {
    /// Property: the lease window is threshold * 2 * (extensions + 1) and grows with every extension
    #[test]
    fn lease_window_follows_extension_count(threshold in threshold_strategy(), extensions in 0u32..200) {
        let window = next_visibility_window(extensions, threshold);
        prop_assert_eq!(window, threshold * 2 * (extensions + 1));
        prop_assert!(next_visibility_window(extensions + 1, threshold) > window);
        prop_assert!(window >= threshold * 2);
    }

    /// Property: exactly the tasks running longer than the threshold are due for extension
    #[test]
    fn only_tasks_past_threshold_are_extended(
        elapsed in elapsed_millis_strategy(),
        threshold_ms in 1u64..1_800_000,
    ) {
        let threshold = Duration::from_millis(threshold_ms);
        let now = Instant::now() + Duration::from_secs(3_600);
        let mut registry = InFlightRegistry::new();
        for (i, handle) in task_handles(elapsed.len()).into_iter().enumerate() {
            let id = i.to_string();
            let message = QueueMessage::new(message_id(&id), format!("rh-{id}"), "{}");
            registry.register(handle, message, now - Duration::from_millis(elapsed[i]), threshold * 2);
        }

        let due = plan_extensions(&registry, now, threshold);
        let expected = elapsed.iter().filter(|ms| Duration::from_millis(**ms) > threshold).count();
        prop_assert_eq!(due.len(), expected);
        for extension in &due {
            prop_assert!(extension.elapsed > threshold);
            prop_assert_eq!(extension.extensions, 0);
            prop_assert_eq!(extension.window, threshold * 2);
        }
    }

    /// Property: one throughput report per full interval, each at a multiple of the interval
    #[test]
    fn throughput_reported_once_per_interval(interval in 1u64..500, successes in 0u64..5_000) {
        let start = Instant::now();
        let mut counter = RateCounter::new(interval, start);
        let mut reports = Vec::new();
        for i in 0..successes {
            if let Some(report) = counter.record_success(start + Duration::from_millis(i)) {
                reports.push(report);
            }
        }

        prop_assert_eq!(reports.len() as u64, successes / interval);
        prop_assert_eq!(counter.total(), successes);
        for (n, report) in reports.iter().enumerate() {
            prop_assert_eq!(report.processed, interval * (n as u64 + 1));
        }
    }

    /// Property: a fetch happens only when the governor does not halt and a worker is free
    #[test]
    fn fetch_requires_free_worker_and_no_halt(
        decision in throttle_decision_strategy(),
        capacity in 1usize..64,
        in_flight in 0usize..80,
    ) {
        let gate = FetchGate::new(Duration::from_millis(250));
        let outcome = gate.evaluate(decision, in_flight, capacity);

        let expected = !decision.is_halt() && in_flight < capacity;
        prop_assert_eq!(outcome.allows_fetch(), expected);
        if !expected {
            prop_assert!(matches!(outcome, GateOutcome::Halted(_) | GateOutcome::Saturated(_)));
        }
    }

    /// Property: negative pauses halt, zero proceeds, positive pauses wait that long
    #[test]
    fn signed_pause_interpretation(seconds in -1_000.0f64..1_000.0) {
        let decision = ThrottleDecision::from_seconds(seconds);
        if seconds < 0.0 {
            prop_assert_eq!(decision, ThrottleDecision::Halt);
        } else if seconds == 0.0 {
            prop_assert_eq!(decision, ThrottleDecision::Proceed);
        } else {
            prop_assert_eq!(decision, ThrottleDecision::Pause(Duration::from_secs_f64(seconds)));
        }
    }
}
