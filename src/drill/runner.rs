use std::time::Duration;

use crate::client::{ClientError, QueueClient, QueueHandle};

/// Drill settings
#[derive(Debug, Clone)]
pub struct DrillConfig {
    /// Trigger used by every scenario
    pub trigger: usize,
    /// Pause after each post/delete, for services whose sizes settle lazily
    pub settle: Duration,
    /// Prefix for scenario queue names, to keep concurrent runs apart
    pub prefix: String,
    /// Body of every posted message
    pub body: String,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            trigger: 10,
            settle: Duration::ZERO,
            prefix: String::new(),
            body: "message".to_string(),
        }
    }
}

impl DrillConfig {
    /// Read drill settings from the environment
    /// QUEUEWATCH_TRIGGER=10
    /// QUEUEWATCH_SETTLE_MS=1000
    /// QUEUEWATCH_PREFIX=ci-
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let trigger = std::env::var("QUEUEWATCH_TRIGGER")
            .ok()
            .and_then(|t| t.parse().ok())
            .filter(|t: &usize| *t >= super::scenarios::MIN_TRIGGER)
            .unwrap_or(defaults.trigger);
        let settle = std::env::var("QUEUEWATCH_SETTLE_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(1));
        let prefix = std::env::var("QUEUEWATCH_PREFIX").unwrap_or_default();

        Self {
            trigger,
            settle,
            prefix,
            ..defaults
        }
    }
}

/// Drives queues through post/delete sequences and checks how many
/// notifications land on their alert queues
pub struct Drill {
    pub(crate) client: QueueClient,
    pub(crate) config: DrillConfig,
    checks: usize,
}

impl Drill {
    pub fn new(client: QueueClient, config: DrillConfig) -> Self {
        Self {
            client,
            config,
            checks: 0,
        }
    }

    /// Number of expectations verified so far
    pub fn checks(&self) -> usize {
        self.checks
    }

    pub(crate) async fn settle(&self) {
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }
    }

    pub(crate) async fn post_messages(&self, queue: &QueueHandle, n: usize) -> Result<(), DrillError> {
        if n > 0 {
            queue.post_n(n, &self.config.body).await?;
        }
        self.settle().await;
        Ok(())
    }

    /// Fetch `n` messages and delete them one by one
    pub(crate) async fn delete_messages(
        &self,
        queue: &QueueHandle,
        n: usize,
    ) -> Result<(), DrillError> {
        if n > 0 {
            for message in queue.reserve(n).await? {
                queue.delete_message(&message.id).await?;
            }
        }
        self.settle().await;
        Ok(())
    }

    pub(crate) async fn delete_queues(&self, queues: &[&QueueHandle]) -> Result<(), DrillError> {
        for queue in queues {
            queue.delete().await?;
        }
        Ok(())
    }

    /// Assert the current size of `alert_queue`
    pub(crate) async fn expect_alerts(
        &mut self,
        step: &str,
        alert_queue: &QueueHandle,
        expected: usize,
    ) -> Result<(), DrillError> {
        let actual = alert_queue.size().await?;
        if actual != expected {
            return Err(DrillError::Expectation {
                step: step.to_string(),
                queue: alert_queue.name().to_string(),
                expected,
                actual,
            });
        }
        self.checks += 1;
        Ok(())
    }

    /// Move `queue` to one message short of `trigger`, check nothing fired,
    /// then move `1 + overhead` more messages past it and check exactly one
    /// notification arrived.
    pub(crate) async fn trigger_alert(
        &mut self,
        queue: &QueueHandle,
        alert_queue: &QueueHandle,
        trigger: usize,
        overhead: usize,
    ) -> Result<(), DrillError> {
        let qsize = queue.size().await?;
        if qsize == trigger {
            return Err(DrillError::AtTrigger {
                queue: queue.name().to_string(),
                trigger,
            });
        }
        let aq_size = alert_queue.size().await?;
        let ascending = qsize < trigger;

        tracing::debug!(
            queue = %queue.name(),
            size = qsize,
            trigger,
            ascending,
            "Approaching trigger"
        );

        if ascending {
            self.post_messages(queue, trigger - qsize - 1).await?;
        } else {
            self.delete_messages(queue, qsize - trigger - 1).await?;
        }
        self.expect_alerts("one short of trigger", alert_queue, aq_size)
            .await?;

        if ascending {
            self.post_messages(queue, 1 + overhead).await?;
        } else {
            self.delete_messages(queue, 1 + overhead).await?;
        }
        self.expect_alerts("past trigger", alert_queue, aq_size + 1)
            .await
    }

    /// Recreate `queue` and its alert queue from scratch, attach one alert,
    /// and check it reads back unchanged
    pub(crate) async fn clear_queue_add_alert(
        &mut self,
        kind: &str,
        trigger: usize,
        direction: &str,
    ) -> Result<(QueueHandle, QueueHandle), DrillError> {
        let name = format!("{}{}-{}-{}", self.config.prefix, kind, direction, trigger);
        let alert_name = format!("{}-alerts", name);

        let queue = self.client.queue(&name);
        let alert_queue = self.client.queue(&alert_name);
        // Deleting rather than clearing also drops old alerts
        self.delete_queues(&[&queue, &alert_queue]).await?;

        queue
            .add_alert(kind, trigger as i64, direction, &alert_name)
            .await?;

        let alerts = queue.list_alerts().await?;
        let matches = alerts.len() == 1
            && alerts[0].kind.as_str() == kind
            && alerts[0].trigger == trigger
            && alerts[0].direction.as_str() == direction
            && alerts[0].queue == alert_name;
        if !matches {
            return Err(DrillError::AlertMismatch {
                queue: name,
                alerts: format!("{:?}", alerts),
            });
        }
        self.checks += 1;

        tracing::info!(queue = %name, kind, trigger, direction, "Scenario queue ready");
        Ok((queue, alert_queue))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("{step}: expected {expected} alerts on '{queue}', found {actual}")]
    Expectation {
        step: String,
        queue: String,
        expected: usize,
        actual: usize,
    },

    #[error("Queue '{queue}' already sits at trigger {trigger}")]
    AtTrigger { queue: String, trigger: usize },

    #[error("Trigger {trigger} is too small for the drill scenarios (minimum {min})")]
    TriggerTooSmall { trigger: usize, min: usize },

    #[error("Queue '{queue}' has unexpected alerts: {alerts}")]
    AlertMismatch { queue: String, alerts: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_alert_ascending() {
        let client = QueueClient::in_memory();
        let mut drill = Drill::new(client, DrillConfig::default());

        let (queue, alert_queue) = drill.clear_queue_add_alert("size", 5, "asc").await.unwrap();
        drill.trigger_alert(&queue, &alert_queue, 5, 2).await.unwrap();

        assert_eq!(queue.size().await.unwrap(), 7);
        assert_eq!(alert_queue.size().await.unwrap(), 1);
        assert_eq!(drill.checks(), 3);
    }

    #[tokio::test]
    async fn test_trigger_alert_at_trigger_is_error() {
        let client = QueueClient::in_memory();
        let mut drill = Drill::new(client, DrillConfig::default());

        let (queue, alert_queue) = drill.clear_queue_add_alert("size", 5, "asc").await.unwrap();
        drill.post_messages(&queue, 5).await.unwrap();

        let err = drill.trigger_alert(&queue, &alert_queue, 5, 0).await.unwrap_err();
        assert!(matches!(err, DrillError::AtTrigger { .. }));
    }

    #[tokio::test]
    async fn test_expectation_failure_reports_step() {
        let client = QueueClient::in_memory();
        let mut drill = Drill::new(client, DrillConfig::default());

        // No alert attached, so crossing the trigger posts nothing
        let queue = drill.client.queue("plain");
        let alert_queue = drill.client.queue("plain-alerts");

        let err = drill.trigger_alert(&queue, &alert_queue, 3, 0).await.unwrap_err();
        match err {
            DrillError::Expectation { step, expected, actual, .. } => {
                assert_eq!(step, "past trigger");
                assert_eq!((expected, actual), (1, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = DrillConfig::default();
        assert_eq!(config.trigger, 10);
        assert!(config.settle.is_zero());
    }
}
