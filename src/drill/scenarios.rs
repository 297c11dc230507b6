//! Alert scenarios
//!
//! Each scenario recreates a queue with one alert rule, walks its size
//! across the trigger in both directions, and checks the number of
//! notifications after every step. Queue sizes in the comments assume the
//! default trigger of 10.

use super::runner::{Drill, DrillError};

/// Smallest trigger for which the scenario step sizes stay meaningful
pub const MIN_TRIGGER: usize = 6;

/// Outcome of a full drill run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillReport {
    pub scenarios: usize,
    pub checks: usize,
}

impl Drill {
    /// Run every scenario, stopping at the first failed expectation
    pub async fn run_all(&mut self) -> Result<DrillReport, DrillError> {
        self.size_alerts().await?;
        self.progressive_alerts().await?;

        Ok(DrillReport {
            scenarios: 6,
            checks: self.checks(),
        })
    }

    fn trigger(&self) -> Result<usize, DrillError> {
        let trigger = self.config.trigger;
        if trigger < MIN_TRIGGER {
            return Err(DrillError::TriggerTooSmall {
                trigger,
                min: MIN_TRIGGER,
            });
        }
        Ok(trigger)
    }

    /// `size` rules in all three directions
    pub async fn size_alerts(&mut self) -> Result<(), DrillError> {
        let t = self.trigger()?;

        // asc
        let (queue, alerts) = self.clear_queue_add_alert("size", t, "asc").await?;

        // 13
        self.trigger_alert(&queue, &alerts, t, 3).await?;

        // 23, no new crossing
        self.post_messages(&queue, t).await?;
        self.expect_alerts("size/asc: above trigger", &alerts, 1).await?;

        // 7, falling never fires an asc rule
        self.delete_messages(&queue, t + 6).await?;
        self.expect_alerts("size/asc: dropped below trigger", &alerts, 1).await?;

        // 10, crossing again
        self.trigger_alert(&queue, &alerts, t, 0).await?;
        self.delete_queues(&[&queue, &alerts]).await?;

        // desc
        let (queue, alerts) = self.clear_queue_add_alert("size", t, "desc").await?;

        // 15, rising never fires a desc rule
        self.post_messages(&queue, t + 5).await?;
        self.expect_alerts("size/desc: rise above trigger", &alerts, 0).await?;

        // 10
        self.trigger_alert(&queue, &alerts, t, 0).await?;

        // 22
        self.post_messages(&queue, t + 2).await?;
        self.expect_alerts("size/desc: rise again", &alerts, 1).await?;

        // 10
        self.trigger_alert(&queue, &alerts, t, 0).await?;

        // 2, already at or below trigger
        self.delete_messages(&queue, t - 2).await?;
        self.expect_alerts("size/desc: keep falling", &alerts, 2).await?;
        self.delete_queues(&[&queue, &alerts]).await?;

        // both
        let (queue, alerts) = self.clear_queue_add_alert("size", t, "both").await?;

        // 10, ascending fire
        self.trigger_alert(&queue, &alerts, t, 0).await?;

        // 18
        self.post_messages(&queue, t - 2).await?;
        self.expect_alerts("size/both: above trigger", &alerts, 1).await?;

        // 7, descending fire
        self.trigger_alert(&queue, &alerts, t, 3).await?;

        // 13, ascending fire
        self.trigger_alert(&queue, &alerts, t, 3).await?;

        self.delete_queues(&[&queue, &alerts]).await
    }

    /// `progressive` rules in all three directions
    pub async fn progressive_alerts(&mut self) -> Result<(), DrillError> {
        let t = self.trigger()?;
        let half = t / 2;

        // asc
        let (queue, alerts) = self
            .clear_queue_add_alert("progressive", t, "asc")
            .await?;

        // 10, 20, 30
        for n in 1..=3 {
            self.trigger_alert(&queue, &alerts, n * t, 0).await?;
        }

        // 15
        self.delete_messages(&queue, t + half).await?;
        self.expect_alerts("progressive/asc: falling", &alerts, 3).await?;

        // 20, the next multiple up
        let size = queue.size().await?;
        let next = size.div_ceil(t) * t;
        self.trigger_alert(&queue, &alerts, next, 0).await?;

        // 1
        self.delete_messages(&queue, next - 1).await?;
        self.expect_alerts("progressive/asc: drain", &alerts, 4).await?;
        self.delete_queues(&[&queue, &alerts]).await?;

        // desc
        let (queue, alerts) = self
            .clear_queue_add_alert("progressive", t, "desc")
            .await?;

        // 25
        self.post_messages(&queue, 2 * t + 5).await?;
        self.expect_alerts("progressive/desc: rising", &alerts, 0).await?;

        // 20, 10
        for n in (1..=2).rev() {
            self.trigger_alert(&queue, &alerts, n * t, 0).await?;
        }

        // 5, zero is not a multiple worth alerting on
        self.delete_messages(&queue, half).await?;
        self.expect_alerts("progressive/desc: below first multiple", &alerts, 2)
            .await?;

        // 20
        self.post_messages(&queue, t + half).await?;
        self.expect_alerts("progressive/desc: rising again", &alerts, 2)
            .await?;
        self.delete_queues(&[&queue, &alerts]).await?;

        // both
        let (queue, alerts) = self
            .clear_queue_add_alert("progressive", t, "both")
            .await?;

        // 12
        self.trigger_alert(&queue, &alerts, t, 2).await?;

        // 20
        self.trigger_alert(&queue, &alerts, 2 * t, 0).await?;

        // 15, leaving a multiple downwards does not fire
        self.delete_messages(&queue, half).await?;
        self.expect_alerts("progressive/both: leave multiple", &alerts, 2)
            .await?;

        // 7, descending fire at 10
        self.trigger_alert(&queue, &alerts, t, 3).await?;

        // 15, ascending fire at 10
        self.trigger_alert(&queue, &alerts, t, 5).await?;

        // 19
        self.post_messages(&queue, t - 5 - 1).await?;
        self.expect_alerts("progressive/both: short of next multiple", &alerts, 4)
            .await?;

        // 11
        self.delete_messages(&queue, t - 2).await?;
        self.expect_alerts("progressive/both: short of previous multiple", &alerts, 4)
            .await?;

        self.delete_queues(&[&queue, &alerts]).await
    }
}
