//! # Ingestion Governor
//!
//! The governor is an external component that watches downstream resource pressure
//! and recommends how long the consumer should wait before pulling more work. Its
//! decision policy is opaque here; the consumer only interprets the answer.

use async_trait::async_trait;
use std::time::Duration;

/// Recommendation returned by a [`Governor`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottleDecision {
    /// Fully throttled: do not fetch this cycle
    Halt,
    /// Fetch immediately
    Proceed,
    /// Sleep, then fetch
    Pause(Duration),
}

impl ThrottleDecision {
    /// Interpret a signed pause in seconds: negative halts, zero proceeds, positive pauses.
    ///
    /// Values that cannot be represented as a pause (NaN, infinity) halt ingestion.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds == 0.0 {
            return Self::Proceed;
        }
        if seconds > 0.0 {
            if let Ok(pause) = Duration::try_from_secs_f64(seconds) {
                return Self::Pause(pause);
            }
        }
        Self::Halt
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt)
    }
}

/// Adaptive throttle consulted before every fetch
#[async_trait]
pub trait Governor: Send {
    async fn govern(&mut self) -> ThrottleDecision;
}

/// Governor that never throttles
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGovernor;

#[async_trait]
impl Governor for NoopGovernor {
    async fn govern(&mut self) -> ThrottleDecision {
        ThrottleDecision::Proceed
    }
}
