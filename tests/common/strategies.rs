use proptest::prelude::*;
use std::time::Duration;

use record_consumer::resilience::ThrottleDecision;

/// Long-record thresholds from one second to a day
pub fn threshold_strategy() -> impl Strategy<Value = Duration> {
    (1u64..=86_400).prop_map(Duration::from_secs)
}

/// Elapsed runtimes of outstanding tasks, in milliseconds
pub fn elapsed_millis_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..3_600_000, 0..16)
}

/// Any governor decision, including zero-length pauses
pub fn throttle_decision_strategy() -> impl Strategy<Value = ThrottleDecision> {
    prop_oneof![
        Just(ThrottleDecision::Halt),
        Just(ThrottleDecision::Proceed),
        (0u64..5_000).prop_map(|ms| ThrottleDecision::Pause(Duration::from_millis(ms))),
    ]
}
