pub mod message;
pub mod queue;

pub use message::{IdGenerator, Message};
pub use queue::{Pushed, Queue, QueueStats, Transition};
