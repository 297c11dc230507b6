use super::message::{IdGenerator, Message};
use crate::alerts::{AlertRule, ConfigError, NewAlert};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Size change produced by one queue operation, with the rules that were
/// attached when it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub old_size: usize,
    pub new_size: usize,
    pub rules: Vec<AlertRule>,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        self.old_size != self.new_size
    }
}

/// Result of appending a batch
#[derive(Debug, Clone)]
pub struct Pushed {
    pub ids: Vec<String>,
    pub transition: Transition,
}

#[derive(Debug, Default)]
struct QueueInner {
    messages: VecDeque<Message>,
    alerts: Vec<AlertRule>,
}

impl QueueInner {
    fn transition(&self, old_size: usize) -> Transition {
        Transition {
            old_size,
            new_size: self.messages.len(),
            rules: self.alerts.clone(),
        }
    }
}

/// A FIFO message queue with attached alert rules.
///
/// Messages and rules share one lock, so every mutation reports a single
/// consistent `(old_size, new_size)` pair and the rules in force at that
/// instant. The queue itself never evaluates rules; callers hand the
/// returned [`Transition`] to the alert engine.
#[derive(Debug)]
pub struct Queue {
    name: String,
    ids: Arc<IdGenerator>,
    inner: RwLock<QueueInner>,
}

impl Queue {
    pub fn new(name: impl Into<String>, ids: Arc<IdGenerator>) -> Self {
        Self {
            name: name.into(),
            ids,
            inner: RwLock::new(QueueInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a batch of message bodies
    pub fn push(&self, bodies: Vec<String>) -> Pushed {
        let mut inner = self.inner.write();
        let old_size = inner.messages.len();

        let mut ids = Vec::with_capacity(bodies.len());
        for body in bodies {
            let id = self.ids.next_id();
            inner.messages.push_back(Message::new(id.clone(), body));
            ids.push(id);
        }

        Pushed {
            ids,
            transition: inner.transition(old_size),
        }
    }

    /// Remove and return up to `n` oldest unreserved messages
    pub fn take(&self, n: usize) -> (Vec<Message>, Transition) {
        let mut inner = self.inner.write();
        let old_size = inner.messages.len();

        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(old_size);
        for message in inner.messages.drain(..) {
            if taken.len() < n && !message.reserved {
                taken.push(message);
            } else {
                kept.push_back(message);
            }
        }
        inner.messages = kept;

        let transition = inner.transition(old_size);
        (taken, transition)
    }

    /// Reserve up to `n` oldest unreserved messages without removing them
    pub fn reserve(&self, n: usize) -> Vec<Message> {
        let mut inner = self.inner.write();
        inner
            .messages
            .iter_mut()
            .filter(|m| !m.reserved)
            .take(n)
            .map(|m| {
                m.reserved = true;
                m.clone()
            })
            .collect()
    }

    /// Return a reserved message to the available pool
    pub fn release(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.reserved = false;
                true
            }
            None => false,
        }
    }

    /// Delete a single message by id
    pub fn remove(&self, id: &str) -> Option<(Message, Transition)> {
        let mut inner = self.inner.write();
        let old_size = inner.messages.len();

        let pos = inner.messages.iter().position(|m| m.id == id)?;
        let message = inner.messages.remove(pos)?;

        Some((message, inner.transition(old_size)))
    }

    /// Delete all messages
    pub fn clear(&self) -> Transition {
        let mut inner = self.inner.write();
        let old_size = inner.messages.len();
        inner.messages.clear();
        inner.transition(old_size)
    }

    /// Validate and attach an alert rule. Does not evaluate the rule.
    pub fn add_alert(&self, spec: &NewAlert) -> Result<AlertRule, ConfigError> {
        let rule = AlertRule::validate(self.ids.next_id(), &self.name, spec)?;
        self.inner.write().alerts.push(rule.clone());
        Ok(rule)
    }

    /// Attached rules in attachment order
    pub fn alerts(&self) -> Vec<AlertRule> {
        self.inner.read().alerts.clone()
    }

    pub fn size(&self) -> usize {
        self.inner.read().messages.len()
    }

    pub fn reserved_count(&self) -> usize {
        self.inner.read().messages.iter().filter(|m| m.reserved).count()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.read();
        QueueStats {
            name: self.name.clone(),
            size: inner.messages.len(),
            reserved: inner.messages.iter().filter(|m| m.reserved).count(),
            alerts: inner.alerts.len(),
        }
    }
}

/// Statistics about a queue
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueStats {
    pub name: String,
    pub size: usize,
    pub reserved: usize,
    pub alerts: usize,
}
