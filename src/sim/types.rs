//! Records produced by the engine's jobs: transfer actions and sensor readings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kind tag carried by every [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    LoadTransfer,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadTransfer => write!(f, "load-transfer"),
        }
    }
}

/// A load transfer performed by one optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub from_node_id: String,
    pub to_node_id: String,
    /// Transferred load (MW, always > 0).
    pub amount: f64,
    pub kind: ActionKind,
}

impl Action {
    pub fn load_transfer(from: &str, to: &str, amount: f64) -> Self {
        Self {
            from_node_id: from.to_string(),
            to_node_id: to.to_string(),
            amount,
            kind: ActionKind::LoadTransfer,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2} MW from {} to {}",
            self.kind, self.amount, self.from_node_id, self.to_node_id
        )
    }
}

/// Synthetic sensor reading derived from a node during a status report.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_id: String,
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    /// Node load at read time (MW).
    pub load: f64,
    /// Line voltage (kV).
    pub voltage: f64,
    /// Grid frequency (Hz).
    pub frequency: f64,
}

/// Lifecycle state of an [`Engine`](super::engine::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_display_uses_kind_tag() {
        let a = Action::load_transfer("NODE-1", "NODE-2", 5.0);
        assert_eq!(a.to_string(), "load-transfer: 5.00 MW from NODE-1 to NODE-2");
    }
}
