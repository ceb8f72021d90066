//! Scenario library: the built-in gallery cards.
//!
//! Every card is pure data: a few steps with literal latencies chosen for
//! pacing, a combinator, and the code sample shown next to it. Extra
//! scenarios can be loaded from a directory of YAML files; a file whose
//! scenario name matches a built-in replaces it.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::domain::{FailureKind, Outcome, Step};

use super::scenario::{Combinator, Scenario, ScenarioError};

/// Ordered collection of scenarios, in gallery order
#[derive(Debug, Clone, Default)]
pub struct Library {
    scenarios: Vec<Scenario>,
}

impl Library {
    /// The twelve built-in cards
    pub fn builtin() -> Result<Self, ScenarioError> {
        let scenarios = vec![
            simulated_api_fetch()?,
            file_upload()?,
            sequential_calls()?,
            parallel_calls()?,
            race_between_tasks()?,
            error_handling()?,
            retry_on_failure()?,
            timeout_cancel()?,
            user_triggered_button()?,
            async_loop()?,
            chained_functions()?,
            heavy_computation()?,
        ];
        Ok(Self { scenarios })
    }

    /// Built-ins plus any scenarios from the configured directory
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let mut library = Self::builtin().context("Built-in scenarios are invalid")?;
        if let Some(dir) = &config.scenarios_dir {
            library.load_dir(dir)?;
        }
        Ok(library)
    }

    /// Load every `*.yaml`/`*.yml` file in `dir`. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "Scenario directory does not exist, skipping");
            return Ok(0);
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read scenario directory: {}", dir.display()))?
        {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if is_yaml {
                paths.push(path);
            }
        }
        // Deterministic order regardless of directory iteration order
        paths.sort();

        for path in &paths {
            let scenario = Scenario::from_file(path)?;
            info!(scenario = %scenario.name, path = %path.display(), "Loaded scenario");
            self.insert(scenario);
        }

        Ok(paths.len())
    }

    /// Add a scenario, replacing any existing one with the same name
    pub fn insert(&mut self, scenario: Scenario) {
        match self.scenarios.iter_mut().find(|s| s.name == scenario.name) {
            Some(existing) => *existing = scenario,
            None => self.scenarios.push(scenario),
        }
    }

    /// Get a scenario by name
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Scenario names in gallery order
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl IntoIterator for Library {
    type Item = Scenario;
    type IntoIter = std::vec::IntoIter<Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.into_iter()
    }
}

// ============================================================================
// Built-in cards
// ============================================================================

fn simulated_api_fetch() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "simulated-api-fetch",
        Combinator::Sequential,
        vec![
            Step::succeed("send request", 1000, json!("request sent")),
            Step::succeed(
                "receive response",
                1000,
                json!({"id": 1, "name": "John Doe", "email": "john@example.com"}),
            ),
        ],
    )?
    .with_card(
        "Simulated API Fetch",
        "Fetch data from a simulated API endpoint with a delay",
        include_str!("../../snippets/simulated_api_fetch.rs"),
    ))
}

fn file_upload() -> Result<Scenario, ScenarioError> {
    const CHUNKS: u64 = 10;
    let steps = (1..=CHUNKS)
        .map(|chunk| {
            Step::succeed(
                format!("chunk {}/{}", chunk, CHUNKS),
                300,
                json!({"progress": chunk * 100 / CHUNKS}),
            )
        })
        .collect();

    Ok(Scenario::new("file-upload", Combinator::Sequential, steps)?.with_card(
        "File Upload with Progress",
        "Upload a file in chunks with progress tracking",
        include_str!("../../snippets/file_upload.rs"),
    ))
}

fn sequential_calls() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "sequential-calls",
        Combinator::Sequential,
        vec![
            Step::succeed("fetch user", 1000, json!({"id": 1, "name": "John Doe"})),
            Step::succeed(
                "fetch posts",
                1000,
                json!([{"id": 1, "title": "First Post"}, {"id": 2, "title": "Second Post"}]),
            ),
            Step::succeed(
                "fetch comments",
                1000,
                json!([{"id": 1, "text": "Great post!"}]),
            ),
        ],
    )?
    .with_card(
        "Sequential Async Calls",
        "Make multiple API calls in sequence",
        include_str!("../../snippets/sequential_calls.rs"),
    ))
}

fn parallel_calls() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "parallel-calls",
        Combinator::Parallel,
        vec![
            Step::succeed("fetch user", 2000, json!({"id": 456, "name": "Alex Johnson"})),
            Step::succeed(
                "fetch posts",
                1500,
                json!([{"id": 1, "title": "Hello World"}, {"id": 2, "title": "Async is awesome"}]),
            ),
            Step::succeed("fetch notifications", 1000, json!({"unread": 3})),
        ],
    )?
    .with_card(
        "Parallel Async Calls",
        "Execute multiple API calls simultaneously",
        include_str!("../../snippets/parallel_calls.rs"),
    ))
}

fn race_between_tasks() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "race-between-tasks",
        Combinator::Race,
        vec![
            Step::succeed("primary server", 3000, json!({"source": "PRIMARY", "response_time": 3000})),
            Step::succeed("fallback server", 1500, json!({"source": "FALLBACK", "response_time": 1500})),
        ],
    )?
    .with_card(
        "Race Between Tasks",
        "Take the result from whichever source answers first",
        include_str!("../../snippets/race_between_tasks.rs"),
    ))
}

fn error_handling() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "error-handling",
        Combinator::Sequential,
        vec![
            Step::succeed("prepare request", 800, json!("prepared")),
            Step::succeed("send request", 800, json!("sent")),
            Step::fail("await response", 800, FailureKind::NetworkError),
        ],
    )?
    .with_card(
        "Error Handling",
        "Handle errors gracefully with Result and match",
        include_str!("../../snippets/error_handling.rs"),
    ))
}

fn retry_on_failure() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "retry-on-failure",
        Combinator::RetryWithBackoff {
            max_attempts: 3,
            base_delay_ms: 1000,
        },
        vec![Step::new(
            "flaky endpoint",
            Duration::from_millis(1000),
            Outcome::Flaky {
                failures: 2,
                error: FailureKind::NetworkError,
                value: json!({"message": "Data retrieved successfully on attempt 3"}),
            },
        )],
    )?
    .with_card(
        "Retry on Failure",
        "Automatically retry failed operations with exponential backoff",
        include_str!("../../snippets/retry_on_failure.rs"),
    ))
}

fn timeout_cancel() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "timeout-cancel",
        Combinator::Timeout { limit_ms: 2000 },
        vec![Step::succeed(
            "slow request",
            5000,
            json!({"data": "This will never be returned due to timeout"}),
        )],
    )?
    .with_card(
        "Timeout / Cancel",
        "Give up on operations that exceed a timeout",
        include_str!("../../snippets/timeout_cancel.rs"),
    ))
}

fn user_triggered_button() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "user-triggered-button",
        Combinator::Sequential,
        vec![Step::succeed(
            "submit form",
            2000,
            json!({"success": true, "message": "Form submitted successfully"}),
        )],
    )?
    .with_card(
        "User-Triggered Button",
        "Handle user interactions with proper button states",
        include_str!("../../snippets/user_triggered_button.rs"),
    ))
}

fn async_loop() -> Result<Scenario, ScenarioError> {
    let steps = [(1, "Alice"), (2, "Bob"), (3, "Charlie")]
        .into_iter()
        .map(|(id, name)| {
            Step::succeed(
                format!("process {}", name),
                500,
                json!({"id": id, "name": name, "processed": true}),
            )
        })
        .collect();

    Ok(Scenario::new("async-loop", Combinator::Sequential, steps)?.with_card(
        "Async Loop",
        "Process a list of items asynchronously",
        include_str!("../../snippets/async_loop.rs"),
    ))
}

fn chained_functions() -> Result<Scenario, ScenarioError> {
    Ok(Scenario::new(
        "chained-functions",
        Combinator::Sequential,
        vec![
            Step::succeed(
                "authenticate",
                1000,
                json!({"user_id": "user123", "token": "jwt-token-here", "expires_in": 3600}),
            ),
            Step::succeed(
                "fetch profile",
                800,
                json!({"id": "user123", "name": "Sarah Johnson", "role": "admin"}),
            ),
            Step::succeed(
                "fetch permissions",
                600,
                json!(["read", "write", "delete", "manage-users"]),
            ),
            Step::succeed("combine session", 0, json!({"is_active": true})),
        ],
    )?
    .with_card(
        "Chained Functions",
        "Chain async functions so each output feeds the next",
        include_str!("../../snippets/chained_functions.rs"),
    ))
}

fn heavy_computation() -> Result<Scenario, ScenarioError> {
    let mut steps = vec![Step::succeed("prepare", 800, json!("ready"))];
    steps.extend((1..=4).map(|quarter| {
        Step::succeed(
            format!("sieve {}%", quarter * 25),
            750,
            json!({"progress": quarter * 25}),
        )
    }));
    steps.push(Step::succeed(
        "collect results",
        150,
        json!({"count": 1229, "message": "Heavy computation completed"}),
    ));

    Ok(Scenario::new("heavy-computation", Combinator::Sequential, steps)?.with_card(
        "Heavy Computation",
        "Run CPU-intensive work without blocking the runtime",
        include_str!("../../snippets/heavy_computation.rs"),
    ))
}
