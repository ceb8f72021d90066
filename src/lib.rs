//! async-gallery - Live demonstrations of async control-flow patterns
//!
//! Each gallery card describes a small simulated workload (steps with a
//! latency and a predetermined outcome) and a combinator that decides how
//! those steps resolve: in sequence, in parallel, as a race, with retries
//! and exponential backoff, or under a timeout. A runner executes the card
//! on the tokio timer and pushes every transition to a display.
//!
//! # Architecture
//!
//! - A run is a state machine: Idle -> Running -> Succeeded | Failed
//! - Every start and reset bumps a generation token; timers from an
//!   abandoned run can never mutate the state of a newer one
//! - Displays are push-only observers behind the `DisplayAdapter` trait
//!
//! # Modules
//!
//! - `adapters`: Displays (terminal, channel) and gallery cards
//! - `core`: Scenarios, simulator, runner and the built-in library
//! - `domain`: Data structures (Step, RunState, StatusEvent, FailureKind)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List the gallery
//! async-gallery list
//!
//! # Run one card at double speed
//! async-gallery run retry-on-failure --speed 2
//!
//! # Run every card at once
//! async-gallery gallery
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{Card, ChannelDisplay, DisplayAdapter, NullDisplay, TerminalDisplay};
pub use crate::core::{Combinator, DemoRunner, Library, Scenario, ScenarioError, Simulator, TimerSimulator};
pub use domain::{FailureKind, RunState, RunStatus, StatusEvent, Step, StepStatus};
