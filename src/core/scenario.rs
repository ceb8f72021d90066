//! Scenario definitions and loading.
//!
//! A scenario is a named composition of steps plus the combinator that
//! decides how they resolve into one outcome. Scenarios are validated when
//! they are built, so a runner never sees a malformed one.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{FailureKind, Latency, Outcome, Step};

/// Errors raised while building a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

fn invalid(message: impl Into<String>) -> ScenarioError {
    ScenarioError::InvalidConfiguration(message.into())
}

/// Control-flow strategy for a scenario's steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// One step at a time, in order
    Sequential,

    /// All steps at once, succeed when all succeed
    Parallel,

    /// All steps at once, first resolution wins
    Race,

    /// Re-run the single step with exponential backoff
    RetryWithBackoff { max_attempts: u32, base_delay_ms: u64 },

    /// Race the single step against a failing timer
    Timeout { limit_ms: u64 },
}

impl Combinator {
    /// Short name used in listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Race => "race",
            Self::RetryWithBackoff { .. } => "retry",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Backoff to wait after failed attempt `attempt` (1-based):
    /// `base_delay_ms * 2^attempt`
    pub fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(base_delay_ms.saturating_mul(factor))
    }

    /// Whether the combinator drives exactly one step
    pub fn requires_single_step(&self) -> bool {
        matches!(self, Self::RetryWithBackoff { .. } | Self::Timeout { .. })
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryWithBackoff {
                max_attempts,
                base_delay_ms,
            } => write!(f, "retry({}x, {}ms base)", max_attempts, base_delay_ms),
            Self::Timeout { limit_ms } => write!(f, "timeout({}ms)", limit_ms),
            other => f.write_str(other.label()),
        }
    }
}

/// A complete scenario definition
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Identifier (used in CLI)
    pub name: String,

    /// Card title
    pub title: String,

    /// One-line description shown under the title
    pub description: String,

    /// Code sample shown alongside the live state
    pub code: String,

    /// How the steps resolve
    pub combinator: Combinator,

    /// Ordered steps
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Build and validate a scenario. Title defaults to the name.
    pub fn new(
        name: impl Into<String>,
        combinator: Combinator,
        steps: Vec<Step>,
    ) -> Result<Self, ScenarioError> {
        let name = name.into();
        let scenario = Self {
            title: name.clone(),
            name,
            description: String::new(),
            code: String::new(),
            combinator,
            steps,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Attach the presentation strings of a gallery card
    pub fn with_card(
        mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.title = title.into();
        self.description = description.into();
        self.code = code.into();
        self
    }

    /// Load a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid scenario file: {}", path.display()))
    }

    /// Parse and validate a scenario from YAML content
    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        let def: ScenarioDef = serde_yaml::from_str(content)?;
        Self::try_from(def)
    }

    /// Validate the scenario definition
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Scenario name cannot be empty"));
        }

        if self.steps.is_empty() {
            return Err(invalid(format!(
                "Scenario '{}' must have at least one step",
                self.name
            )));
        }

        if self.combinator.requires_single_step() && self.steps.len() != 1 {
            return Err(invalid(format!(
                "Scenario '{}' uses {} which requires exactly one step, found {}",
                self.name,
                self.combinator.label(),
                self.steps.len()
            )));
        }

        if let Combinator::RetryWithBackoff { max_attempts, .. } = self.combinator {
            if max_attempts == 0 {
                return Err(invalid(format!(
                    "Scenario '{}' must allow at least one attempt",
                    self.name
                )));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(invalid(format!(
                    "Step {} of scenario '{}' has an empty name",
                    i, self.name
                )));
            }

            if let Latency::Jitter { min, max } = step.latency {
                if min > max {
                    return Err(invalid(format!(
                        "Step '{}' has jitter minimum {:?} above maximum {:?}",
                        step.name, min, max
                    )));
                }
            }

            if let Outcome::Chance { success_rate, .. } = step.outcome {
                if !(0.0..=1.0).contains(&success_rate) {
                    return Err(invalid(format!(
                        "Step '{}' has success rate {} outside 0..=1",
                        step.name, success_rate
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get a step by name
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Expected wall time of a run when every step resolves at its
    /// nominal latency and nothing fails early
    pub fn nominal_duration(&self) -> Duration {
        let latencies = self.steps.iter().map(|s| s.latency.nominal());
        match self.combinator {
            Combinator::Sequential => latencies.sum(),
            Combinator::Parallel => latencies.max().unwrap_or_default(),
            Combinator::Race => latencies.min().unwrap_or_default(),
            Combinator::Timeout { limit_ms } => latencies
                .min()
                .unwrap_or_default()
                .min(Duration::from_millis(limit_ms)),
            Combinator::RetryWithBackoff {
                max_attempts,
                base_delay_ms,
            } => {
                let Some(step) = self.steps.first() else {
                    return Duration::ZERO;
                };
                let attempts = match step.outcome {
                    Outcome::Failure(_) => max_attempts,
                    Outcome::Flaky { failures, .. } => (failures + 1).min(max_attempts),
                    _ => 1,
                };
                let backoff: Duration = (1..attempts)
                    .map(|attempt| Combinator::backoff_delay(base_delay_ms, attempt))
                    .sum();
                step.latency.nominal() * attempts + backoff
            }
        }
    }
}

// ============================================================================
// YAML schema
// ============================================================================

/// Raw scenario file schema (matches YAML structure)
#[derive(Debug, Deserialize)]
struct ScenarioDef {
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    code: String,
    combinator: CombinatorDef,
    steps: Vec<StepDef>,
}

/// Numbers are read signed so negative values surface as configuration
/// errors rather than parse errors.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CombinatorDef {
    Sequential,
    Parallel,
    Race,
    RetryWithBackoff {
        max_attempts: i64,
        base_delay_ms: i64,
    },
    Timeout {
        limit_ms: i64,
    },
}

#[derive(Debug, Deserialize)]
struct StepDef {
    name: String,
    #[serde(default)]
    duration_ms: Option<i64>,
    #[serde(default)]
    jitter: Option<JitterDef>,
    /// Outcomes and failures are written as single-key maps
    /// (`success: 1`, `failure: { server_error: 503 }`)
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    outcome: OutcomeDef,
}

#[derive(Debug, Deserialize)]
struct JitterDef {
    min_ms: i64,
    max_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OutcomeDef {
    Success(Value),
    Failure(FailureKind),
    Flaky {
        failures: i64,
        error: FailureKind,
        #[serde(default)]
        value: Value,
    },
    Chance {
        success_rate: f64,
        error: FailureKind,
        #[serde(default)]
        value: Value,
    },
}

fn non_negative(value: i64, what: &str) -> Result<u64, ScenarioError> {
    u64::try_from(value).map_err(|_| invalid(format!("{} must be non-negative, got {}", what, value)))
}

impl TryFrom<CombinatorDef> for Combinator {
    type Error = ScenarioError;

    fn try_from(def: CombinatorDef) -> Result<Self, Self::Error> {
        Ok(match def {
            CombinatorDef::Sequential => Self::Sequential,
            CombinatorDef::Parallel => Self::Parallel,
            CombinatorDef::Race => Self::Race,
            CombinatorDef::RetryWithBackoff {
                max_attempts,
                base_delay_ms,
            } => Self::RetryWithBackoff {
                max_attempts: u32::try_from(non_negative(max_attempts, "max_attempts")?)
                    .map_err(|_| invalid("max_attempts is too large"))?,
                base_delay_ms: non_negative(base_delay_ms, "base_delay_ms")?,
            },
            CombinatorDef::Timeout { limit_ms } => Self::Timeout {
                limit_ms: non_negative(limit_ms, "limit_ms")?,
            },
        })
    }
}

impl TryFrom<StepDef> for Step {
    type Error = ScenarioError;

    fn try_from(def: StepDef) -> Result<Self, Self::Error> {
        let latency = match (def.duration_ms, def.jitter) {
            (Some(ms), None) => Latency::Fixed(Duration::from_millis(non_negative(
                ms,
                &format!("duration_ms of step '{}'", def.name),
            )?)),
            (None, Some(jitter)) => Latency::Jitter {
                min: Duration::from_millis(non_negative(jitter.min_ms, "jitter.min_ms")?),
                max: Duration::from_millis(non_negative(jitter.max_ms, "jitter.max_ms")?),
            },
            (Some(_), Some(_)) => {
                return Err(invalid(format!(
                    "Step '{}' sets both duration_ms and jitter",
                    def.name
                )))
            }
            (None, None) => {
                return Err(invalid(format!(
                    "Step '{}' needs duration_ms or jitter",
                    def.name
                )))
            }
        };

        let outcome = match def.outcome {
            OutcomeDef::Success(value) => Outcome::Success(value),
            OutcomeDef::Failure(error) => Outcome::Failure(error),
            OutcomeDef::Flaky {
                failures,
                error,
                value,
            } => Outcome::Flaky {
                failures: u32::try_from(non_negative(failures, "failures")?)
                    .map_err(|_| invalid("failures is too large"))?,
                error,
                value,
            },
            OutcomeDef::Chance {
                success_rate,
                error,
                value,
            } => Outcome::Chance {
                success_rate,
                error,
                value,
            },
        };

        Ok(Self {
            name: def.name,
            latency,
            outcome,
        })
    }
}

impl TryFrom<ScenarioDef> for Scenario {
    type Error = ScenarioError;

    fn try_from(def: ScenarioDef) -> Result<Self, Self::Error> {
        let combinator = Combinator::try_from(def.combinator)?;
        let steps = def
            .steps
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let title = def.title.unwrap_or_else(|| def.name.clone());
        Ok(Self::new(def.name, combinator, steps)?.with_card(title, def.description, def.code))
    }
}
