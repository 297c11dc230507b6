//! queuewatch: In-Memory Message Queues with Size Alerts
//!
//! A message queue service whose queues carry alert rules. When a queue's
//! message count crosses a rule's trigger, a notification message is posted
//! onto the rule's target queue.
//!
//! # Features
//!
//! - **FIFO Queues**: Batch post, take, reserve/delete and release
//! - **Size Alerts**: Fire when the queue size reaches a fixed trigger
//! - **Progressive Alerts**: Fire at every multiple of the trigger
//! - **Directions**: Ascending, descending, or both
//! - **HTTP API**: JSON endpoints over the same store
//! - **Clients**: In-process and HTTP backends behind one interface
//! - **Drill**: Scenario runner checking alert behavior end to end
//!
//! # Example
//!
//! ```
//! use queuewatch::alerts::NewAlert;
//! use queuewatch::storage::QueueStore;
//!
//! let store = QueueStore::new();
//! store
//!     .add_alert("jobs", &NewAlert::new("size", 10, "asc", "jobs-alerts"))
//!     .unwrap();
//!
//! store.post("jobs", vec!["message".to_string(); 13]).unwrap();
//! assert_eq!(store.size("jobs-alerts").unwrap(), 1);
//! ```

pub mod alerts;
pub mod api;
pub mod client;
pub mod data;
pub mod drill;
pub mod storage;

// Re-export commonly used types
pub use alerts::{AlertEngine, AlertRule, AlertType, ConfigError, Direction, NewAlert};
pub use client::{ClientError, QueueClient, QueueHandle};
pub use data::{Message, Queue};
pub use storage::{QueueStore, StoreError};
