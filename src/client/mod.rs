//! Queue service client
//!
//! [`QueueBackend`] is the narrow interface a queue service exposes to its
//! consumers. [`InMemoryBackend`] runs it against an in-process
//! [`QueueStore`](crate::storage::QueueStore), [`HttpBackend`] against a
//! remote server. [`QueueClient`] and [`QueueHandle`] sit on top and apply
//! the consumer-side conventions: sizes and alert lists of missing queues
//! read as empty, and deleting a missing queue is not an error.

pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::alerts::{AlertRule, ConfigError, NewAlert};
use crate::data::Message;
use crate::storage::StoreError;

pub use http::HttpBackend;
pub use memory::InMemoryBackend;

/// Operations a queue service offers its clients
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Append a batch of message bodies, returning the new message ids
    async fn post(&self, queue: &str, bodies: Vec<String>) -> Result<Vec<String>, ClientError>;

    /// Remove and return up to `n` oldest available messages
    async fn get(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError>;

    /// Reserve up to `n` oldest available messages without removing them
    async fn reserve(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError>;

    async fn delete_message(&self, queue: &str, id: &str) -> Result<(), ClientError>;

    async fn size(&self, queue: &str) -> Result<usize, ClientError>;

    async fn delete_queue(&self, queue: &str) -> Result<(), ClientError>;

    async fn add_alert(&self, queue: &str, alert: &NewAlert) -> Result<AlertRule, ClientError>;

    async fn list_alerts(&self, queue: &str) -> Result<Vec<AlertRule>, ClientError>;
}

/// Entry point for talking to a queue service
#[derive(Clone)]
pub struct QueueClient {
    backend: Arc<dyn QueueBackend>,
}

impl QueueClient {
    pub fn new(backend: impl QueueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Client over a fresh in-process store
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::default())
    }

    /// Client for the server at `base_url`, e.g. `http://127.0.0.1:8080`
    pub fn http(base_url: impl Into<String>) -> Self {
        Self::new(HttpBackend::new(base_url))
    }

    /// Handle for the named queue. The queue is not created until something
    /// is posted to it or an alert is attached.
    pub fn queue(&self, name: impl Into<String>) -> QueueHandle {
        QueueHandle {
            name: name.into(),
            backend: Arc::clone(&self.backend),
        }
    }
}

/// Named queue on a [`QueueClient`]
#[derive(Clone)]
pub struct QueueHandle {
    name: String,
    backend: Arc<dyn QueueBackend>,
}

impl QueueHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn post(&self, bodies: Vec<String>) -> Result<Vec<String>, ClientError> {
        self.backend.post(&self.name, bodies).await
    }

    /// Post `n` copies of `body` as one batch
    pub async fn post_n(&self, n: usize, body: &str) -> Result<Vec<String>, ClientError> {
        self.post(vec![body.to_string(); n]).await
    }

    pub async fn get(&self, n: usize) -> Result<Vec<Message>, ClientError> {
        self.backend.get(&self.name, n).await
    }

    pub async fn reserve(&self, n: usize) -> Result<Vec<Message>, ClientError> {
        self.backend.reserve(&self.name, n).await
    }

    pub async fn delete_message(&self, id: &str) -> Result<(), ClientError> {
        self.backend.delete_message(&self.name, id).await
    }

    /// Current size; 0 when the queue does not exist
    pub async fn size(&self) -> Result<usize, ClientError> {
        match self.backend.size(&self.name).await {
            Err(ClientError::NotFound(_)) => Ok(0),
            other => other,
        }
    }

    /// Delete the queue and its alerts. Missing queues are ignored.
    pub async fn delete(&self) -> Result<(), ClientError> {
        match self.backend.delete_queue(&self.name).await {
            Err(ClientError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    pub async fn add_alert(
        &self,
        kind: &str,
        trigger: i64,
        direction: &str,
        target: &str,
    ) -> Result<AlertRule, ClientError> {
        let alert = NewAlert::new(kind, trigger, direction, target);
        self.backend.add_alert(&self.name, &alert).await
    }

    /// Attached alerts in attachment order; empty when the queue does not exist
    pub async fn list_alerts(&self) -> Result<Vec<AlertRule>, ClientError> {
        match self.backend.list_alerts(&self.name).await {
            Err(ClientError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid alert: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Config(e) => ClientError::Config(e),
            e @ (StoreError::QueueNotFound(_) | StoreError::MessageNotFound { .. }) => {
                ClientError::NotFound(e.to_string())
            }
        }
    }
}
