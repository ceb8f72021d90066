//! Domain types for the gallery.
//!
//! This module contains the core data structures:
//! - Step: a simulated delayed unit of work
//! - Run: per-runner execution state
//! - Events: notifications pushed to displays
//! - Failure: the failure taxonomy

pub mod events;
pub mod failure;
pub mod run;
pub mod step;

// Re-export commonly used types
pub use events::{EventKind, StatusEvent, StepStatus};
pub use failure::FailureKind;
pub use run::{RunState, RunStatus};
pub use step::{Latency, Outcome, Step, StepResult};
