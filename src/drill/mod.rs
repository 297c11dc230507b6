//! Alert drill
//!
//! Exercises a queue service through any [`QueueBackend`](crate::client::QueueBackend)
//! and verifies that size and progressive alerts fire exactly when they
//! should. Runs against the in-process store in tests and against a live
//! server from the `drill` binary.

pub mod runner;
pub mod scenarios;

pub use runner::{Drill, DrillConfig, DrillError};
pub use scenarios::{DrillReport, MIN_TRIGGER};
