//! Two-factor fetch gate: worker capacity and the governor's decision.

use std::time::Duration;

use super::governor::ThrottleDecision;

/// What the consumer does with the fetch step of one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    /// Governor halted ingestion; back off and re-evaluate
    Halted(Duration),
    /// Every worker is busy; back off and re-evaluate
    Saturated(Duration),
    /// Sleep for the governor's pause, then fetch
    PauseThenFetch(Duration),
    /// Fetch now
    Fetch,
}

impl GateOutcome {
    pub fn allows_fetch(&self) -> bool {
        matches!(self, Self::PauseThenFetch(_) | Self::Fetch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchGate {
    backoff: Duration,
}

impl FetchGate {
    /// Gate that backs off for `backoff` whenever fetching is not allowed
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// A full pool never fetches, whatever the governor says
    pub fn evaluate(
        &self,
        decision: ThrottleDecision,
        in_flight: usize,
        capacity: usize,
    ) -> GateOutcome {
        if decision.is_halt() {
            return GateOutcome::Halted(self.backoff);
        }
        if in_flight >= capacity {
            return GateOutcome::Saturated(self.backoff);
        }
        match decision {
            ThrottleDecision::Pause(pause) if !pause.is_zero() => GateOutcome::PauseThenFetch(pause),
            _ => GateOutcome::Fetch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKOFF: Duration = Duration::from_secs(1);

    #[test]
    fn test_halt_blocks_fetch() {
        let gate = FetchGate::new(BACKOFF);
        let outcome = gate.evaluate(ThrottleDecision::Halt, 0, 4);
        assert_eq!(outcome, GateOutcome::Halted(BACKOFF));
        assert!(!outcome.allows_fetch());
    }

    #[test]
    fn test_full_pool_blocks_fetch_regardless_of_decision() {
        let gate = FetchGate::new(BACKOFF);
        for decision in [
            ThrottleDecision::Proceed,
            ThrottleDecision::Pause(Duration::from_millis(5)),
        ] {
            assert_eq!(gate.evaluate(decision, 4, 4), GateOutcome::Saturated(BACKOFF));
        }
    }

    #[test]
    fn test_pause_and_proceed() {
        let gate = FetchGate::new(BACKOFF);
        assert_eq!(
            gate.evaluate(ThrottleDecision::Pause(Duration::from_millis(300)), 1, 4),
            GateOutcome::PauseThenFetch(Duration::from_millis(300))
        );
        assert_eq!(gate.evaluate(ThrottleDecision::Proceed, 3, 4), GateOutcome::Fetch);
    }
}
