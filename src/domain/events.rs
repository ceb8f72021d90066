//! Notifications pushed from a runner to its display.
//!
//! The runner calls its display adapter directly. `StatusEvent` is the
//! owned form of those calls, for displays that forward notifications
//! elsewhere (channels, logs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::run::RunStatus;

/// One pushed notification, stamped with the card it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Scenario name of the emitting card
    pub card: String,

    /// When the notification was emitted
    pub timestamp: DateTime<Utc>,

    /// What changed
    pub kind: EventKind,
}

impl StatusEvent {
    /// Create an event with the current timestamp
    pub fn new(card: impl Into<String>, kind: EventKind) -> Self {
        Self {
            card: card.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// True when this event carries a terminal run status
    pub fn is_terminal(&self) -> bool {
        matches!(&self.kind, EventKind::Status { status, .. } if status.is_terminal())
    }
}

/// Kinds of notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EventKind {
    /// Run status or attempt changed
    Status { status: RunStatus, attempt: u32 },

    /// One step's status changed
    Step {
        index: usize,
        name: String,
        status: StepStatus,
    },
}

/// Status of a single step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started
    Pending,

    /// Timer in flight
    Running,

    /// Resolved with a value
    Succeeded,

    /// Resolved with a failure
    Failed,

    /// Left behind when the run settled without it
    Abandoned,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;

    #[test]
    fn test_event_serialization() {
        let event = StatusEvent::new(
            "race-between-tasks",
            EventKind::Step {
                index: 1,
                name: "fallback".to_string(),
                status: StepStatus::Abandoned,
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        let parsed: StatusEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, event);
        assert!(json.contains("\"type\":\"step\""));
        assert!(!parsed.is_terminal());
    }

    #[test]
    fn test_terminal_detection() {
        let failed = StatusEvent::new(
            "timeout-cancel",
            EventKind::Status {
                status: RunStatus::Failed {
                    error: FailureKind::Timeout { limit_ms: 2000 },
                },
                attempt: 0,
            },
        );
        let running = StatusEvent::new(
            "timeout-cancel",
            EventKind::Status {
                status: RunStatus::Running,
                attempt: 0,
            },
        );

        assert!(failed.is_terminal());
        assert!(!running.is_terminal());
    }
}
