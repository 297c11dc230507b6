use std::sync::Arc;

use async_trait::async_trait;

use super::{ClientError, QueueBackend};
use crate::alerts::{AlertRule, NewAlert};
use crate::data::Message;
use crate::storage::QueueStore;

/// In-process queue service. Size changes are visible immediately, so no
/// settling delay is needed between an operation and the next read.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<QueueStore>,
}

impl InMemoryBackend {
    pub fn new(store: Arc<QueueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }
}

#[async_trait]
impl QueueBackend for InMemoryBackend {
    async fn post(&self, queue: &str, bodies: Vec<String>) -> Result<Vec<String>, ClientError> {
        Ok(self.store.post(queue, bodies)?)
    }

    async fn get(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError> {
        Ok(self.store.get(queue, n)?)
    }

    async fn reserve(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError> {
        Ok(self.store.reserve(queue, n)?)
    }

    async fn delete_message(&self, queue: &str, id: &str) -> Result<(), ClientError> {
        self.store.delete_message(queue, id)?;
        Ok(())
    }

    async fn size(&self, queue: &str) -> Result<usize, ClientError> {
        Ok(self.store.size(queue)?)
    }

    async fn delete_queue(&self, queue: &str) -> Result<(), ClientError> {
        Ok(self.store.delete_queue(queue)?)
    }

    async fn add_alert(&self, queue: &str, alert: &NewAlert) -> Result<AlertRule, ClientError> {
        Ok(self.store.add_alert(queue, alert)?)
    }

    async fn list_alerts(&self, queue: &str) -> Result<Vec<AlertRule>, ClientError> {
        Ok(self.store.list_alerts(queue)?)
    }
}
