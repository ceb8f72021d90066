//! Step simulation.
//!
//! A simulator turns a step into a future that resolves to the step's
//! outcome after the step's latency. The runner only ever talks to the
//! `Simulator` trait, so tests and tools can swap the clock or the
//! outcome source.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{trace, warn};

use crate::config::TimingSettings;
use crate::domain::{Step, StepResult};

/// Source of simulated step resolutions
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Human-readable simulator name
    fn name(&self) -> &str;

    /// Wait out the step's latency and resolve its outcome for the given
    /// 1-based attempt
    async fn simulate(&self, step: &Step, attempt: u32) -> StepResult;

    /// Wait on the same clock as `simulate` (used for retry backoff)
    async fn pause(&self, delay: Duration);
}

/// Simulator backed by the tokio timer
///
/// Latencies and pauses are divided by `speed`, so `speed: 2.0` runs a
/// scenario at double pace. Jitter and chance outcomes draw from a
/// seedable RNG.
pub struct TimerSimulator {
    speed: f64,
    rng: Mutex<StdRng>,
}

impl Default for TimerSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSimulator {
    /// Real-time simulator with an entropy-seeded RNG
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Real-time simulator with a reproducible RNG
    pub fn with_seed(seed: u64) -> Self {
        Self {
            speed: 1.0,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build from resolved timing settings
    pub fn from_settings(settings: &TimingSettings) -> Self {
        let simulator = match settings.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        simulator.with_speed(settings.speed)
    }

    /// Set the time scale; non-positive or non-finite values are ignored
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        } else {
            warn!(speed, "Ignoring invalid simulation speed");
        }
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Convert a simulated duration to runtime time, saturating at
    /// `Duration::MAX` for very slow speeds
    pub fn scale(&self, duration: Duration) -> Duration {
        if self.speed == 1.0 {
            duration
        } else {
            Duration::try_from_secs_f64(duration.as_secs_f64() / self.speed)
                .unwrap_or(Duration::MAX)
        }
    }
}

#[async_trait]
impl Simulator for TimerSimulator {
    fn name(&self) -> &str {
        "timer"
    }

    async fn simulate(&self, step: &Step, attempt: u32) -> StepResult {
        // Draw everything up front so the lock is never held across the sleep
        let (latency, result) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let latency = step.latency.sample(&mut *rng);
            let result = step.outcome.resolve(attempt, &mut *rng);
            (latency, result)
        };

        trace!(step = %step.name, attempt, latency_ms = latency.as_millis() as u64, "Simulating step");
        tokio::time::sleep(self.scale(latency)).await;
        result
    }

    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(self.scale(delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureKind, Outcome};
    use serde_json::json;
    use tokio::time::Instant;

    #[test]
    fn test_simulator_creation() {
        let simulator = TimerSimulator::with_seed(3);
        assert_eq!(simulator.name(), "timer");
        assert_eq!(simulator.speed(), 1.0);
    }

    #[test]
    fn test_speed_scaling() {
        let simulator = TimerSimulator::new().with_speed(4.0);
        assert_eq!(simulator.scale(Duration::from_millis(2000)), Duration::from_millis(500));

        let ignored = TimerSimulator::new().with_speed(0.0);
        assert_eq!(ignored.speed(), 1.0);
    }

    #[test]
    fn test_extreme_slowdown_saturates() {
        let simulator = TimerSimulator::new().with_speed(1e-300);
        assert_eq!(simulator.scale(Duration::from_millis(1000)), Duration::MAX);
        assert_eq!(simulator.scale(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_slowdown_keeps_waiting() {
        let simulator = TimerSimulator::new().with_speed(1e-300);
        let step = Step::succeed("glacial", 1000, json!(null));

        let waited =
            tokio::time::timeout(Duration::from_secs(1), simulator.simulate(&step, 1)).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_waits_for_latency() {
        let simulator = TimerSimulator::with_seed(9);
        let step = Step::succeed("fetch", 1500, json!({"id": 1}));

        let start = Instant::now();
        let result = simulator.simulate(&step, 1).await;

        assert_eq!(result, Ok(json!({"id": 1})));
        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert!(start.elapsed() < Duration::from_millis(1510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_failure_after_latency() {
        let simulator = TimerSimulator::with_seed(9).with_speed(2.0);
        let step = Step::new(
            "flaky",
            Duration::from_millis(1000),
            Outcome::Flaky {
                failures: 1,
                error: FailureKind::NetworkError,
                value: json!("ok"),
            },
        );

        let start = Instant::now();
        assert_eq!(simulator.simulate(&step, 1).await, Err(FailureKind::NetworkError));
        assert_eq!(simulator.simulate(&step, 2).await, Ok(json!("ok")));

        // Two 1000ms steps at double speed
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1010));
    }
}
