pub mod store;

pub use store::{QueueStore, StoreError};
