//! # Resilience Module
//!
//! Backpressure for ingestion. The consumer never pulls more work than it can
//! execute, and never pulls work while the external governor says downstream
//! resources are under pressure.
//!
//! ## Usage
//!
//! ```rust
//! use record_consumer::resilience::{FetchGate, GateOutcome, ThrottleDecision};
//! use std::time::Duration;
//!
//! let gate = FetchGate::new(Duration::from_secs(1));
//! let outcome = gate.evaluate(ThrottleDecision::from_seconds(0.0), 2, 8);
//! assert_eq!(outcome, GateOutcome::Fetch);
//! ```

pub mod fetch_gate;
pub mod governor;

pub use fetch_gate::{FetchGate, GateOutcome};
pub use governor::{Governor, NoopGovernor, ThrottleDecision};
