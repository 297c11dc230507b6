use crate::alerts::{AlertEngine, AlertRule, ConfigError, NewAlert, Notification, Notifier};
use crate::data::{IdGenerator, Message, Queue, QueueStats, Transition};
use dashmap::DashMap;
use std::sync::Arc;

/// Registry of all queues, and the place where size changes meet alert rules
pub struct QueueStore {
    /// Queues indexed by name
    queues: DashMap<String, Arc<Queue>>,
    /// Message and alert ids, unique across the store
    ids: Arc<IdGenerator>,
    engine: AlertEngine,
    notifier: Notifier,
}

impl QueueStore {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            ids: Arc::new(IdGenerator::new()),
            engine: AlertEngine::new(),
            notifier: Notifier::new(),
        }
    }

    /// Get or create a queue
    pub fn get_or_create_queue(&self, name: &str) -> Arc<Queue> {
        if let Some(queue) = self.queues.get(name) {
            return Arc::clone(&queue);
        }

        let entry = self
            .queues
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(queue = %name, "Creating queue");
                Arc::new(Queue::new(name, Arc::clone(&self.ids)))
            });
        Arc::clone(entry.value())
    }

    /// Get an existing queue
    pub fn get_queue(&self, name: &str) -> Option<Arc<Queue>> {
        self.queues.get(name).map(|q| Arc::clone(&q))
    }

    fn require_queue(&self, name: &str) -> Result<Arc<Queue>, StoreError> {
        self.get_queue(name)
            .ok_or_else(|| StoreError::QueueNotFound(name.to_string()))
    }

    /// Delete a queue together with its alert rules
    pub fn delete_queue(&self, name: &str) -> Result<(), StoreError> {
        match self.queues.remove(name) {
            Some((_, queue)) => {
                tracing::debug!(queue = %name, alerts = queue.alerts().len(), "Deleted queue");
                Ok(())
            }
            None => Err(StoreError::QueueNotFound(name.to_string())),
        }
    }

    /// List all queue names, sorted
    pub fn list_queues(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Post a batch of messages, creating the queue if needed.
    ///
    /// Alert rules are evaluated once for the whole batch, and any
    /// notifications are posted before this returns.
    pub fn post(&self, name: &str, bodies: Vec<String>) -> Result<Vec<String>, StoreError> {
        if bodies.is_empty() {
            return Ok(Vec::new());
        }

        let queue = self.get_or_create_queue(name);
        let pushed = queue.push(bodies);
        self.dispatch(&queue, &pushed.transition);
        Ok(pushed.ids)
    }

    /// Remove and return up to `n` oldest available messages
    pub fn get(&self, name: &str, n: usize) -> Result<Vec<Message>, StoreError> {
        let queue = self.require_queue(name)?;
        let (taken, transition) = queue.take(n);
        self.dispatch(&queue, &transition);
        Ok(taken)
    }

    /// Reserve up to `n` oldest available messages. Size does not change.
    pub fn reserve(&self, name: &str, n: usize) -> Result<Vec<Message>, StoreError> {
        Ok(self.require_queue(name)?.reserve(n))
    }

    /// Return a reserved message to the queue
    pub fn release(&self, name: &str, id: &str) -> Result<(), StoreError> {
        if self.require_queue(name)?.release(id) {
            Ok(())
        } else {
            Err(StoreError::MessageNotFound {
                queue: name.to_string(),
                id: id.to_string(),
            })
        }
    }

    /// Delete one message
    pub fn delete_message(&self, name: &str, id: &str) -> Result<Message, StoreError> {
        let queue = self.require_queue(name)?;
        let (message, transition) = queue.remove(id).ok_or_else(|| StoreError::MessageNotFound {
            queue: name.to_string(),
            id: id.to_string(),
        })?;
        self.dispatch(&queue, &transition);
        Ok(message)
    }

    /// Delete every message in a queue, keeping the queue and its rules
    pub fn clear(&self, name: &str) -> Result<usize, StoreError> {
        let queue = self.require_queue(name)?;
        let transition = queue.clear();
        self.dispatch(&queue, &transition);
        Ok(transition.old_size)
    }

    pub fn size(&self, name: &str) -> Result<usize, StoreError> {
        Ok(self.require_queue(name)?.size())
    }

    pub fn queue_stats(&self, name: &str) -> Result<QueueStats, StoreError> {
        Ok(self.require_queue(name)?.stats())
    }

    pub fn all_queue_stats(&self) -> Vec<QueueStats> {
        let mut stats: Vec<QueueStats> = self.queues.iter().map(|e| e.value().stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Attach an alert rule, creating the queue if needed
    pub fn add_alert(&self, name: &str, spec: &NewAlert) -> Result<AlertRule, StoreError> {
        let queue = self.get_or_create_queue(name);
        let rule = queue.add_alert(spec)?;

        tracing::info!(
            queue = %name,
            alert_id = %rule.id,
            kind = %rule.kind,
            trigger = rule.trigger,
            direction = %rule.direction,
            target = %rule.queue,
            "Alert attached"
        );

        Ok(rule)
    }

    pub fn list_alerts(&self, name: &str) -> Result<Vec<AlertRule>, StoreError> {
        Ok(self.require_queue(name)?.alerts())
    }

    /// Evaluate `queue`'s rules against one transition and notify targets.
    ///
    /// Only the rules of the queue the operation ran on are evaluated.
    /// Notifications are pushed straight onto the target queue and never
    /// re-enter this method.
    fn dispatch(&self, queue: &Queue, transition: &Transition) {
        if !transition.is_change() || transition.rules.is_empty() {
            return;
        }

        let (old_size, new_size) = (transition.old_size, transition.new_size);
        for firing in &self.engine.evaluate(&transition.rules, old_size, new_size) {
            let target = self.get_or_create_queue(&firing.rule.queue);
            let notification = Notification::new(queue.name(), firing, new_size);
            self.notifier.notify(&target, &notification);
        }
    }
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Queue '{0}' not found")]
    QueueNotFound(String),

    #[error("Message '{id}' not found in queue '{queue}'")]
    MessageNotFound { queue: String, id: String },

    #[error("Invalid alert: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::QueueNotFound(_) | StoreError::MessageNotFound { .. }
        )
    }
}
