//! Lease extension arithmetic for long-running records.
//!
//! A task older than the long-record threshold gets its message hidden for
//! `threshold * 2 * (extensions + 1)` from the time of the sweep. The window grows
//! linearly with the number of extensions already granted, so a persistently slow
//! record is swept less often relative to its age.

use std::time::Duration;
use tokio::time::Instant;

use super::registry::InFlightRegistry;
use crate::execution::TaskHandle;

/// Visibility window for a task that has already been extended `extensions` times
pub fn next_visibility_window(extensions: u32, threshold: Duration) -> Duration {
    threshold
        .saturating_mul(2)
        .saturating_mul(extensions.saturating_add(1))
}

/// Lease extension due for one outstanding task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseExtension {
    pub handle: TaskHandle,
    pub elapsed: Duration,
    /// Extensions granted before this one
    pub extensions: u32,
    pub window: Duration,
}

/// Extensions due at `now`: one for every task running longer than `threshold`
pub fn plan_extensions(
    registry: &InFlightRegistry,
    now: Instant,
    threshold: Duration,
) -> Vec<LeaseExtension> {
    registry
        .oldest_first()
        .into_iter()
        .filter_map(|task| {
            let elapsed = task.elapsed(now);
            (elapsed > threshold).then(|| LeaseExtension {
                handle: task.handle,
                elapsed,
                extensions: task.extensions,
                window: next_visibility_window(task.extensions, threshold),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::QueueMessage;

    const THRESHOLD: Duration = Duration::from_secs(300);

    fn message() -> QueueMessage {
        QueueMessage::new("m-1", "rh-1", r#"{"DATA_SOURCE":"TEST","RECORD_ID":"1"}"#)
    }

    #[test]
    fn test_window_grows_with_extension_count() {
        assert_eq!(next_visibility_window(0, THRESHOLD), Duration::from_secs(600));
        assert_eq!(next_visibility_window(1, THRESHOLD), Duration::from_secs(1200));
        assert_eq!(next_visibility_window(4, THRESHOLD), Duration::from_secs(3000));
        assert_eq!(next_visibility_window(u32::MAX, Duration::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn test_tasks_under_threshold_are_left_alone() {
        let mut registry = InFlightRegistry::new();
        let start = Instant::now();
        let handle = TaskHandle::from(tokio::spawn(async {}).id());
        registry.register(handle, message(), start, THRESHOLD * 2);

        assert!(plan_extensions(&registry, start + THRESHOLD, THRESHOLD).is_empty());
        assert!(plan_extensions(&registry, start + THRESHOLD / 2, THRESHOLD).is_empty());
    }

    #[tokio::test]
    async fn test_successive_sweeps_extend_slow_task() {
        let mut registry = InFlightRegistry::new();
        let start = Instant::now();
        let handle = TaskHandle::from(tokio::spawn(async {}).id());
        registry.register(handle, message(), start, THRESHOLD * 2);

        let first_sweep = start + THRESHOLD.mul_f64(1.1);
        let planned = plan_extensions(&registry, first_sweep, THRESHOLD);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].extensions, 0);
        assert_eq!(planned[0].window, THRESHOLD * 2);
        registry.record_extension(handle, planned[0].window, first_sweep);

        let second_sweep = start + THRESHOLD.mul_f64(2.2);
        let planned = plan_extensions(&registry, second_sweep, THRESHOLD);
        assert_eq!(planned[0].extensions, 1);
        assert_eq!(planned[0].window, THRESHOLD * 4);
        assert_eq!(
            registry.record_extension(handle, planned[0].window, second_sweep),
            Some(2)
        );
    }
}
