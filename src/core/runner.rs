//! Demonstration runner.
//!
//! Owns the lifecycle of one card's simulated run: start trigger,
//! combinator execution, current state, and settlement. Every start and
//! reset bumps a generation token; mutations carrying an older generation
//! are dropped, so timers from an abandoned run can never touch the state
//! of a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::adapters::DisplayAdapter;
use crate::domain::{
    FailureKind, Outcome, RunState, RunStatus, Step, StepResult, StepStatus,
};

use super::scenario::{Combinator, Scenario, ScenarioError};
use super::simulator::Simulator;

/// Runs one scenario on demand and pushes every transition to a display
pub struct DemoRunner {
    scenario: Arc<Scenario>,
    simulator: Arc<dyn Simulator>,
    display: Arc<dyn DisplayAdapter>,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the runner and its run task
struct Shared {
    inner: Mutex<Inner>,
    updates: watch::Sender<RunState>,
}

struct Inner {
    state: RunState,
    clock: Option<Instant>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DemoRunner {
    /// Create a runner for a scenario, validating it first
    pub fn new(
        scenario: Scenario,
        simulator: Arc<dyn Simulator>,
        display: Arc<dyn DisplayAdapter>,
    ) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let state = RunState::idle(0, scenario.steps.len());
        let (updates, _) = watch::channel(state.clone());

        Ok(Self {
            scenario: Arc::new(scenario),
            simulator,
            display,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner { state, clock: None }),
                updates,
            }),
            task: Mutex::new(None),
        })
    }

    /// The scenario this runner executes
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Snapshot of the current run state
    pub fn state(&self) -> RunState {
        self.shared.lock().state.clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.shared.updates.subscribe()
    }

    /// Start a new run
    ///
    /// Returns `false` and changes nothing while a run is in progress.
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self), fields(scenario = %self.scenario.name))]
    pub fn start(&self) -> bool {
        let Some(ctx) = self.begin() else {
            debug!("Run already in progress, ignoring start");
            return false;
        };

        let handle = tokio::spawn(execute(ctx));
        if let Some(previous) = self.task_slot().replace(handle) {
            previous.abort();
        }
        true
    }

    /// Abandon the current run (if any) and return to idle
    #[instrument(skip(self), fields(scenario = %self.scenario.name))]
    pub fn reset(&self) {
        if let Some(handle) = self.task_slot().take() {
            handle.abort();
        }

        let mut inner = self.shared.lock();
        let was_idle = inner.state.is_idle();
        let generation = inner.state.generation + 1;
        inner.state = RunState::idle(generation, self.scenario.steps.len());
        inner.clock = None;

        if !was_idle {
            info!(generation, "Run abandoned");
            self.display.on_status_change(&inner.state.status, 0);
        }
        self.shared.updates.send_replace(inner.state.clone());
    }

    /// Wait until the runner is no longer running and return its state
    pub async fn wait(&self) -> RunState {
        let mut updates = self.subscribe();
        let settled = updates
            .wait_for(|state| !state.is_running())
            .await
            .map(|state| (*state).clone());

        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Start a run and wait for it to settle
    pub async fn run(&self) -> RunState {
        self.start();
        self.wait().await
    }

    /// Move to `Running` under a fresh generation and hand back the context
    /// the run task mutates state through
    fn begin(&self) -> Option<RunContext> {
        let mut inner = self.shared.lock();
        if inner.state.is_running() {
            return None;
        }

        let step_count = self.scenario.steps.len();
        if !inner.state.is_idle() {
            // Settled runs pass through Idle before re-entering Running
            inner.state = RunState::idle(inner.state.generation, step_count);
            self.display.on_status_change(&inner.state.status, 0);
        }

        let generation = inner.state.generation + 1;
        inner.state = RunState::running(generation, step_count);
        inner.clock = Some(Instant::now());

        info!(
            generation,
            run_id = ?inner.state.run_id,
            combinator = %self.scenario.combinator,
            "Starting run"
        );
        self.display.on_status_change(&inner.state.status, 0);
        self.shared.updates.send_replace(inner.state.clone());

        Some(RunContext {
            generation,
            scenario: Arc::clone(&self.scenario),
            simulator: Arc::clone(&self.simulator),
            display: Arc::clone(&self.display),
            shared: Arc::clone(&self.shared),
        })
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DemoRunner {
    fn drop(&mut self) {
        let slot = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Handle through which one run task mutates runner state
///
/// Every mutation is checked against the generation captured at start; a
/// stale context is a no-op.
#[derive(Clone)]
struct RunContext {
    generation: u64,
    scenario: Arc<Scenario>,
    simulator: Arc<dyn Simulator>,
    display: Arc<dyn DisplayAdapter>,
    shared: Arc<Shared>,
}

impl RunContext {
    /// Apply `f` if this run is still the current one and still running.
    /// Returns whether it was applied.
    fn update(&self, f: impl FnOnce(&mut Inner, &dyn DisplayAdapter)) -> bool {
        let mut inner = self.shared.lock();
        if inner.state.generation != self.generation || !inner.state.is_running() {
            return false;
        }
        f(&mut *inner, self.display.as_ref());
        self.shared.updates.send_replace(inner.state.clone());
        true
    }

    fn set_attempt(&self, attempt: u32) -> bool {
        self.update(|inner, display| {
            inner.state.attempt = attempt;
            display.on_status_change(&inner.state.status, attempt);
        })
    }

    /// Record a step transition; indices past the scenario's steps belong to
    /// synthetic steps and are not tracked
    fn mark_step(&self, index: usize, status: StepStatus) -> bool {
        let Some(step) = self.scenario.steps.get(index) else {
            return false;
        };
        self.update(|inner, display| {
            if let Some(slot) = inner.state.steps.get_mut(index) {
                if *slot != status {
                    *slot = status;
                    display.on_step_change(index, step, status);
                }
            }
        })
    }

    /// Mark every in-flight step as abandoned
    fn abandon_running(&self) {
        let scenario = &self.scenario;
        self.update(|inner, display| {
            for (index, slot) in inner.state.steps.iter_mut().enumerate() {
                if *slot == StepStatus::Running {
                    *slot = StepStatus::Abandoned;
                    if let Some(step) = scenario.steps.get(index) {
                        display.on_step_change(index, step, StepStatus::Abandoned);
                    }
                }
            }
        });
    }

    /// Terminal transition; only the first settlement of a run applies
    fn settle(&self, result: StepResult) -> bool {
        let scenario = self.scenario.name.as_str();
        self.update(|inner, display| {
            inner.state.status = match result {
                Ok(result) => RunStatus::Succeeded { result },
                Err(error) => RunStatus::Failed { error },
            };
            inner.state.ended_at = Some(chrono::Utc::now());
            inner.state.elapsed = inner.clock.map(|started| started.elapsed());

            let elapsed_ms = inner.state.elapsed.map(|e| e.as_millis() as u64);
            match &inner.state.status {
                RunStatus::Failed { error } => {
                    warn!(scenario, generation = inner.state.generation, elapsed_ms, %error, "Run failed")
                }
                _ => info!(scenario, generation = inner.state.generation, elapsed_ms, "Run succeeded"),
            }
            display.on_status_change(&inner.state.status, inner.state.attempt);
        })
    }
}

/// Body of the spawned run task
async fn execute(ctx: RunContext) {
    let result = match ctx.scenario.combinator {
        Combinator::Sequential => run_sequential(&ctx).await,
        Combinator::Parallel => run_parallel(&ctx).await,
        Combinator::Race => run_race(&ctx, ctx.scenario.steps.clone()).await,
        Combinator::RetryWithBackoff {
            max_attempts,
            base_delay_ms,
        } => run_retry(&ctx, max_attempts, base_delay_ms).await,
        Combinator::Timeout { limit_ms } => run_timeout(&ctx, limit_ms).await,
    };

    if !ctx.settle(result) {
        debug!(generation = ctx.generation, "Discarding result of stale run");
    }
}

async fn run_sequential(ctx: &RunContext) -> StepResult {
    let mut values = Vec::with_capacity(ctx.scenario.steps.len());

    for (index, step) in ctx.scenario.steps.iter().enumerate() {
        ctx.mark_step(index, StepStatus::Running);
        match ctx.simulator.simulate(step, 1).await {
            Ok(value) => {
                ctx.mark_step(index, StepStatus::Succeeded);
                values.push(value);
            }
            Err(error) => {
                ctx.mark_step(index, StepStatus::Failed);
                return Err(error);
            }
        }
    }

    Ok(Value::Array(values))
}

/// Start every step at once on its own timer task
fn spawn_steps(ctx: &RunContext, steps: Vec<Step>) -> JoinSet<(usize, StepResult)> {
    let mut set = JoinSet::new();
    for (index, step) in steps.into_iter().enumerate() {
        ctx.mark_step(index, StepStatus::Running);
        let simulator = Arc::clone(&ctx.simulator);
        set.spawn(async move {
            let result = simulator.simulate(&step, 1).await;
            (index, result)
        });
    }
    set
}

/// Next resolved step in timer-firing order
async fn next_resolved(set: &mut JoinSet<(usize, StepResult)>) -> Option<(usize, StepResult)> {
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(resolved) => return Some(resolved),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => continue,
        }
    }
    None
}

async fn run_parallel(ctx: &RunContext) -> StepResult {
    let mut values = vec![Value::Null; ctx.scenario.steps.len()];
    let mut set = spawn_steps(ctx, ctx.scenario.steps.clone());

    while let Some((index, result)) = next_resolved(&mut set).await {
        match result {
            Ok(value) => {
                ctx.mark_step(index, StepStatus::Succeeded);
                values[index] = value;
            }
            Err(error) => {
                ctx.mark_step(index, StepStatus::Failed);
                set.abort_all();
                ctx.abandon_running();
                return Err(error);
            }
        }
    }

    Ok(Value::Array(values))
}

async fn run_race(ctx: &RunContext, steps: Vec<Step>) -> StepResult {
    let mut set = spawn_steps(ctx, steps);

    if let Some((index, result)) = next_resolved(&mut set).await {
        let status = if result.is_ok() {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        };
        ctx.mark_step(index, status);
        set.abort_all();
        ctx.abandon_running();
        return result;
    }

    // Unreachable for validated scenarios, which always have a step
    Ok(Value::Null)
}

async fn run_retry(ctx: &RunContext, max_attempts: u32, base_delay_ms: u64) -> StepResult {
    let Some(step) = ctx.scenario.steps.first() else {
        return Ok(Value::Null);
    };

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        ctx.set_attempt(attempt);
        ctx.mark_step(0, StepStatus::Running);

        match ctx.simulator.simulate(step, attempt).await {
            Ok(value) => {
                ctx.mark_step(0, StepStatus::Succeeded);
                return Ok(value);
            }
            Err(error) => {
                ctx.mark_step(0, StepStatus::Failed);

                if attempt >= max_attempts {
                    return Err(FailureKind::ExhaustedRetries {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }

                let delay = Combinator::backoff_delay(base_delay_ms, attempt);
                warn!(
                    step = %step.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "Step failed, retrying"
                );
                ctx.simulator.pause(delay).await;
            }
        }
    }
}

async fn run_timeout(ctx: &RunContext, limit_ms: u64) -> StepResult {
    let Some(step) = ctx.scenario.steps.first() else {
        return Ok(Value::Null);
    };

    let timer = Step::new(
        "timeout",
        std::time::Duration::from_millis(limit_ms),
        Outcome::Failure(FailureKind::Timeout { limit_ms }),
    );
    run_race(ctx, vec![step.clone(), timer]).await
}
