//! A gallery card: title, description, code sample and a live runner.

use std::sync::Arc;

use super::DisplayAdapter;
use crate::core::{DemoRunner, Scenario, ScenarioError, Simulator};
use crate::domain::RunState;

/// One demonstration card
pub struct Card {
    runner: DemoRunner,
}

impl Card {
    pub fn new(
        scenario: Scenario,
        simulator: Arc<dyn Simulator>,
        display: Arc<dyn DisplayAdapter>,
    ) -> Result<Self, ScenarioError> {
        Ok(Self {
            runner: DemoRunner::new(scenario, simulator, display)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.runner.scenario().name
    }

    pub fn title(&self) -> &str {
        &self.runner.scenario().title
    }

    pub fn description(&self) -> &str {
        &self.runner.scenario().description
    }

    pub fn code(&self) -> &str {
        &self.runner.scenario().code
    }

    /// Code sample with a line-number gutter
    pub fn render_code(&self) -> String {
        render_code(self.code())
    }

    /// Press the card's button. Ignored while a run is in progress.
    pub fn start(&self) -> bool {
        self.runner.start()
    }

    pub fn reset(&self) {
        self.runner.reset()
    }

    pub fn state(&self) -> RunState {
        self.runner.state()
    }

    pub fn runner(&self) -> &DemoRunner {
        &self.runner
    }
}

/// Prefix every line of `code` with a right-aligned line number
pub fn render_code(code: &str) -> String {
    let lines: Vec<&str> = code.trim_end().lines().collect();
    let width = lines.len().to_string().len();

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} | {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
