//! Steps: simulated units of asynchronous work.
//!
//! A step is immutable once composed into a scenario. Its latency and
//! outcome are resolved freshly every time the step is simulated, so a
//! retried step can fail on early attempts and succeed later.

use std::time::Duration;

use rand::Rng;
use serde_json::Value;

use super::failure::FailureKind;

/// Result of simulating one step
pub type StepResult = Result<Value, FailureKind>;

/// One simulated delayed unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Label shown by displays
    pub name: String,

    /// How long the step takes
    pub latency: Latency,

    /// What the step resolves to
    pub outcome: Outcome,
}

impl Step {
    /// Create a step with a fixed latency
    pub fn new(name: impl Into<String>, duration: Duration, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            latency: Latency::Fixed(duration),
            outcome,
        }
    }

    /// Step that succeeds with `value` after `duration_ms`
    pub fn succeed(name: impl Into<String>, duration_ms: u64, value: Value) -> Self {
        Self::new(
            name,
            Duration::from_millis(duration_ms),
            Outcome::Success(value),
        )
    }

    /// Step that fails with `error` after `duration_ms`
    pub fn fail(name: impl Into<String>, duration_ms: u64, error: FailureKind) -> Self {
        Self::new(
            name,
            Duration::from_millis(duration_ms),
            Outcome::Failure(error),
        )
    }

    /// Replace the fixed latency with a uniformly drawn one
    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.latency = Latency::Jitter { min, max };
        self
    }
}

/// Simulated latency of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latency {
    /// Always the same duration
    Fixed(Duration),

    /// Uniformly drawn from `min..=max` on every simulation
    Jitter { min: Duration, max: Duration },
}

impl Latency {
    /// Upper bound of the latency, used for pacing estimates
    pub fn nominal(&self) -> Duration {
        match *self {
            Self::Fixed(duration) => duration,
            Self::Jitter { max, .. } => max,
        }
    }

    /// Draw a concrete latency
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Self::Fixed(duration) => duration,
            Self::Jitter { min, max } if min >= max => min,
            Self::Jitter { min, max } => {
                let millis = rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64);
                Duration::from_millis(millis)
            }
        }
    }
}

/// How a step resolves
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Always succeeds with the value
    Success(Value),

    /// Always fails with the error
    Failure(FailureKind),

    /// Fails the first `failures` attempts, then succeeds
    Flaky {
        failures: u32,
        error: FailureKind,
        value: Value,
    },

    /// Succeeds with probability `success_rate`
    Chance {
        success_rate: f64,
        error: FailureKind,
        value: Value,
    },
}

impl Outcome {
    /// Resolve the outcome for a 1-based attempt number
    pub fn resolve<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> StepResult {
        match self {
            Self::Success(value) => Ok(value.clone()),
            Self::Failure(error) => Err(error.clone()),
            Self::Flaky {
                failures,
                error,
                value,
            } => {
                if attempt <= *failures {
                    Err(error.clone())
                } else {
                    Ok(value.clone())
                }
            }
            Self::Chance {
                success_rate,
                error,
                value,
            } => {
                let p = if success_rate.is_finite() {
                    success_rate.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if rng.gen_bool(p) {
                    Ok(value.clone())
                } else {
                    Err(error.clone())
                }
            }
        }
    }

    /// Whether the outcome can ever fail
    pub fn can_fail(&self) -> bool {
        match self {
            Self::Success(_) => false,
            Self::Failure(_) => true,
            Self::Flaky { failures, .. } => *failures > 0,
            Self::Chance { success_rate, .. } => *success_rate < 1.0,
        }
    }
}
