//! Queue alert rules
//!
//! Rules are attached to a queue and evaluated on every operation that
//! changes its size. A rule that fires posts a notification message onto its
//! target queue.

pub mod config;
pub mod engine;
pub mod notifier;

pub use config::{AlertRule, AlertType, ConfigError, Direction, NewAlert};
pub use engine::{AlertEngine, Firing};
pub use notifier::{Notification, Notifier};
