//! Alert rule configuration types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of alert rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Fires when the queue size crosses `trigger`
    Size,
    /// Fires each time the queue size crosses a multiple of `trigger`
    Progressive,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Size => "size",
            AlertType::Progressive => "progressive",
        }
    }
}

impl FromStr for AlertType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(AlertType::Size),
            "progressive" => Ok(AlertType::Progressive),
            _ => Err(ConfigError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of size change an alert reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
            Direction::Both => "both",
        }
    }

    /// Whether increasing transitions are watched
    pub fn ascending(&self) -> bool {
        matches!(self, Direction::Asc | Direction::Both)
    }

    /// Whether decreasing transitions are watched
    pub fn descending(&self) -> bool {
        matches!(self, Direction::Desc | Direction::Both)
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            "both" => Ok(Direction::Both),
            _ => Err(ConfigError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert rule as submitted by a caller, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub trigger: i64,
    #[serde(default = "default_direction")]
    pub direction: String,
    /// Target queue name
    #[serde(default)]
    pub queue: String,
}

fn default_direction() -> String {
    Direction::Asc.as_str().to_string()
}

impl NewAlert {
    pub fn new(
        kind: impl Into<String>,
        trigger: i64,
        direction: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            trigger,
            direction: direction.into(),
            queue: queue.into(),
        }
    }
}

/// Alert rule attached to a queue. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub trigger: usize,
    pub direction: Direction,
    /// Target queue receiving notifications
    pub queue: String,
}

impl AlertRule {
    /// Validate a submitted rule for attachment to `source_queue`
    pub fn validate(
        id: impl Into<String>,
        source_queue: &str,
        spec: &NewAlert,
    ) -> Result<Self, ConfigError> {
        let kind: AlertType = spec.kind.parse()?;
        let direction: Direction = spec.direction.parse()?;

        if spec.trigger <= 0 {
            return Err(ConfigError::InvalidTrigger(spec.trigger));
        }

        let target = spec.queue.trim();
        if target.is_empty() {
            return Err(ConfigError::MissingTargetQueue);
        }
        if target == source_queue {
            return Err(ConfigError::SelfTarget(source_queue.to_string()));
        }

        Ok(Self {
            id: id.into(),
            kind,
            trigger: spec.trigger as usize,
            direction,
            queue: target.to_string(),
        })
    }
}

/// Alert configuration errors, raised when a rule is attached
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown alert type '{0}' (expected 'size' or 'progressive')")]
    UnknownType(String),

    #[error("Unknown alert direction '{0}' (expected 'asc', 'desc' or 'both')")]
    UnknownDirection(String),

    #[error("Alert trigger must be a positive integer, got {0}")]
    InvalidTrigger(i64),

    #[error("Alert target queue name is empty")]
    MissingTargetQueue,

    #[error("Alert target queue must differ from the watched queue '{0}'")]
    SelfTarget(String),
}
