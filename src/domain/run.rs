//! Run state of a demonstration runner.
//!
//! A `RunState` is owned by exactly one runner. Its status only moves
//! along `Idle -> Running -> {Succeeded, Failed}`; starting again resets
//! it to `Idle` under a fresh generation first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::events::StepStatus;
use super::failure::FailureKind;

/// Mutable per-execution record of one runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Generation token of the run this state belongs to
    pub generation: u64,

    /// Correlation id of the current run (None while idle)
    pub run_id: Option<Uuid>,

    /// Current status
    pub status: RunStatus,

    /// Current attempt (retry scenarios only, 1-based while running)
    pub attempt: u32,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run settled
    pub ended_at: Option<DateTime<Utc>>,

    /// Time from start to settlement on the runtime clock
    pub elapsed: Option<Duration>,

    /// Status of each scenario step, in scenario order
    pub steps: Vec<StepStatus>,
}

impl RunState {
    /// Fresh idle state for a scenario with `step_count` steps
    pub fn idle(generation: u64, step_count: usize) -> Self {
        Self {
            generation,
            run_id: None,
            status: RunStatus::Idle,
            attempt: 0,
            started_at: None,
            ended_at: None,
            elapsed: None,
            steps: vec![StepStatus::Pending; step_count],
        }
    }

    /// Fresh running state for a new generation
    pub fn running(generation: u64, step_count: usize) -> Self {
        Self {
            run_id: Some(Uuid::new_v4()),
            status: RunStatus::Running,
            started_at: Some(Utc::now()),
            ..Self::idle(generation, step_count)
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.status, RunStatus::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running)
    }

    /// Check if the run has settled (successfully or not)
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Success value of a settled run
    pub fn result(&self) -> Option<&Value> {
        match &self.status {
            RunStatus::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    /// Failure of a settled run
    pub fn error(&self) -> Option<&FailureKind> {
        match &self.status {
            RunStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Count of steps currently in `status`
    pub fn count_steps(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| **s == status).count()
    }
}

/// Status of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunStatus {
    /// Not started, or reset
    Idle,

    /// Combinator executing
    Running,

    /// Settled with a value
    Succeeded { result: Value },

    /// Settled with a failure
    Failed { error: FailureKind },
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Short name used by displays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_idle_state() {
        let state = RunState::idle(0, 3);

        assert!(state.is_idle());
        assert!(!state.is_finished());
        assert!(state.run_id.is_none());
        assert_eq!(state.count_steps(StepStatus::Pending), 3);
    }

    #[test]
    fn test_running_state() {
        let state = RunState::running(4, 2);

        assert!(state.is_running());
        assert_eq!(state.generation, 4);
        assert!(state.run_id.is_some());
        assert!(state.started_at.is_some());
        assert!(state.ended_at.is_none());
    }

    #[test]
    fn test_settled_accessors() {
        let mut state = RunState::running(1, 1);
        state.status = RunStatus::Succeeded {
            result: json!({"id": 1}),
        };

        assert!(state.is_finished());
        assert_eq!(state.result(), Some(&json!({"id": 1})));
        assert!(state.error().is_none());
        assert_eq!(state.status.label(), "succeeded");
    }

    #[test]
    fn test_status_serialization() {
        let status = RunStatus::Failed {
            error: FailureKind::NetworkError,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"failed","error":"network_error"}"#);

        let parsed: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
