//! Notification delivery for fired alerts

use serde::{Deserialize, Serialize};

use super::config::{AlertType, Direction};
use super::engine::Firing;
use crate::data::Queue;

/// Body of the message posted to an alert's target queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub source_queue: String,
    pub alert_id: String,
    pub alert_type: AlertType,
    pub alert_direction: Direction,
    pub alert_trigger: usize,
    /// Threshold that was crossed
    pub crossed: usize,
    /// "asc" or "desc", the direction the queue size actually moved
    pub movement: Direction,
    /// Source queue size after the triggering operation
    pub queue_size: usize,
    pub timestamp: String,
}

impl Notification {
    pub fn new(source_queue: &str, firing: &Firing, queue_size: usize) -> Self {
        Self {
            source_queue: source_queue.to_string(),
            alert_id: firing.rule.id.clone(),
            alert_type: firing.rule.kind,
            alert_direction: firing.rule.direction,
            alert_trigger: firing.rule.trigger,
            crossed: firing.threshold,
            movement: if firing.rising {
                Direction::Asc
            } else {
                Direction::Desc
            },
            queue_size,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Encode as a message body
    pub fn to_body(&self) -> String {
        // Plain struct of strings and integers, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode from a message body
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Posts notifications onto target queues
#[derive(Debug, Default, Clone, Copy)]
pub struct Notifier;

impl Notifier {
    pub fn new() -> Self {
        Self
    }

    /// Enqueue a notification on `target`.
    ///
    /// Goes through `Queue::push`, which never evaluates the target queue's
    /// own rules, so alert chains cannot recurse.
    pub fn notify(&self, target: &Queue, notification: &Notification) -> String {
        let ids = target.push(vec![notification.to_body()]).ids;

        tracing::info!(
            queue = %notification.source_queue,
            alert_id = %notification.alert_id,
            target = %target.name(),
            crossed = notification.crossed,
            queue_size = notification.queue_size,
            "Alert triggered"
        );

        ids.into_iter().next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::config::AlertRule;
    use crate::data::IdGenerator;
    use std::sync::Arc;

    fn firing() -> Firing {
        Firing {
            rule: AlertRule {
                id: "a1".to_string(),
                kind: AlertType::Progressive,
                trigger: 10,
                direction: Direction::Both,
                queue: "jobs-alerts".to_string(),
            },
            threshold: 20,
            rising: false,
        }
    }

    #[test]
    fn test_notification_body() {
        let notification = Notification::new("jobs", &firing(), 19);
        let decoded = Notification::from_body(&notification.to_body()).unwrap();

        assert_eq!(decoded.source_queue, "jobs");
        assert_eq!(decoded.crossed, 20);
        assert_eq!(decoded.movement, Direction::Desc);
        assert_eq!(decoded.queue_size, 19);
    }

    #[test]
    fn test_notify_posts_one_message() {
        let target = Queue::new("jobs-alerts", Arc::new(IdGenerator::default()));
        let notification = Notification::new("jobs", &firing(), 19);

        let id = Notifier::new().notify(&target, &notification);

        assert!(!id.is_empty());
        assert_eq!(target.size(), 1);
    }
}
