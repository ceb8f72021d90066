//! Core demonstration engine.
//!
//! This module contains:
//! - Scenario: Step compositions and YAML loading
//! - Simulator: Timer-backed step resolution
//! - Runner: Generation-guarded run lifecycle and combinators
//! - Library: The built-in gallery cards

pub mod library;
pub mod runner;
pub mod scenario;
pub mod simulator;

// Re-export commonly used types
pub use library::Library;
pub use runner::DemoRunner;
pub use scenario::{Combinator, Scenario, ScenarioError};
pub use simulator::{Simulator, TimerSimulator};
