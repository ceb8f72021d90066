//! Command-line interface for async-gallery.
//!
//! Provides commands for listing the gallery, inspecting a card, running
//! one card or the whole gallery at once, and running scenario files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::adapters::{card, Card, ChannelDisplay, TerminalDisplay};
use crate::config::{self, ResolvedConfig, TimingSettings};
use crate::core::{Library, Scenario, TimerSimulator};
use crate::domain::{EventKind, Latency, Outcome, RunState, RunStatus};

/// async-gallery - Live demonstrations of async control-flow patterns
#[derive(Parser, Debug)]
#[command(name = "async-gallery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the scenarios in the gallery
    List,

    /// Show a scenario's steps and code sample
    Show {
        /// Scenario name (see `list`)
        name: String,
    },

    /// Run one scenario and print its transitions
    Run {
        /// Scenario name (see `list`)
        name: String,

        /// Print the code sample before running
        #[arg(long)]
        code: bool,

        /// RNG seed for jitter and chance outcomes
        #[arg(long)]
        seed: Option<u64>,

        /// Time scale (2.0 runs twice as fast)
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Start every card at once and follow them until all settle
    Gallery {
        /// Time scale (2.0 runs twice as fast)
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Validate and run a scenario from a YAML file
    File {
        /// Path to the scenario file
        path: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::List => list_scenarios(),
            Commands::Show { name } => show_scenario(&name),
            Commands::Run {
                name,
                code,
                seed,
                speed,
            } => run_scenario(&name, code, seed, speed).await,
            Commands::Gallery { speed } => run_gallery(speed).await,
            Commands::File { path } => run_file(&path).await,
            Commands::Config => show_config(),
        }
    }
}

fn load_library() -> Result<(Library, &'static ResolvedConfig)> {
    let cfg = config::config()?;
    let library = Library::from_config(cfg)?;
    Ok((library, cfg))
}

fn find_scenario(library: &Library, name: &str) -> Result<Scenario> {
    library.get(name).cloned().with_context(|| {
        format!(
            "Scenario '{}' not found. Available: {}",
            name,
            library.names().join(", ")
        )
    })
}

/// Timing settings with command-line overrides applied
fn timing(cfg: &ResolvedConfig, seed: Option<u64>, speed: Option<f64>) -> Result<TimingSettings> {
    let speed = match speed {
        Some(speed) => config::validate_speed(speed, "--speed")?,
        None => cfg.timing.speed,
    };
    Ok(TimingSettings {
        speed,
        seed: seed.or(cfg.timing.seed),
    })
}

/// List all scenarios
fn list_scenarios() -> Result<()> {
    let (library, _) = load_library()?;

    println!("{:<24} {:<26} {:<30}", "NAME", "COMBINATOR", "TITLE");
    println!("{}", "-".repeat(80));

    for scenario in library.iter() {
        println!(
            "{:<24} {:<26} {:<30}",
            scenario.name,
            scenario.combinator.to_string(),
            scenario.title
        );
    }

    Ok(())
}

/// Show a single scenario
fn show_scenario(name: &str) -> Result<()> {
    let (library, _) = load_library()?;
    let scenario = find_scenario(&library, name)?;

    println!("{}", scenario.title);
    if !scenario.description.is_empty() {
        println!("{}", scenario.description);
    }
    println!();
    println!("Combinator: {}", scenario.combinator);
    println!(
        "Expected duration: {}ms",
        scenario.nominal_duration().as_millis()
    );
    println!();
    println!(
        "{:<4} {:<24} {:<16} {:<20} {:<8}",
        "#", "STEP", "LATENCY", "OUTCOME", "CAN FAIL"
    );
    println!("{}", "-".repeat(76));

    for (i, step) in scenario.steps.iter().enumerate() {
        let latency = match step.latency {
            Latency::Fixed(d) => format!("{}ms", d.as_millis()),
            Latency::Jitter { min, max } => format!("{}-{}ms", min.as_millis(), max.as_millis()),
        };
        let outcome = match &step.outcome {
            Outcome::Success(_) => "success".to_string(),
            Outcome::Failure(error) => format!("fail: {}", error.label()),
            Outcome::Flaky { failures, .. } => format!("flaky ({} failures)", failures),
            Outcome::Chance { success_rate, .. } => {
                format!("chance ({:.0}%)", success_rate * 100.0)
            }
        };
        let can_fail = if step.outcome.can_fail() { "yes" } else { "no" };
        println!(
            "{:<4} {:<24} {:<16} {:<20} {:<8}",
            i + 1,
            step.name,
            latency,
            outcome,
            can_fail
        );
    }

    if !scenario.code.is_empty() {
        println!();
        println!("{}", card::render_code(&scenario.code));
    }

    Ok(())
}

/// Run a single card with the terminal display
async fn run_scenario(
    name: &str,
    show_code: bool,
    seed: Option<u64>,
    speed: Option<f64>,
) -> Result<()> {
    let (library, cfg) = load_library()?;
    let scenario = find_scenario(&library, name)?;
    let timing = timing(cfg, seed, speed)?;

    run_card(scenario, &timing, show_code || cfg.show_code).await
}

/// Validate and run a scenario file
async fn run_file(path: &Path) -> Result<()> {
    let cfg = config::config()?;
    let scenario = Scenario::from_file(path)?;

    run_card(scenario, &cfg.timing, cfg.show_code).await
}

async fn run_card(scenario: Scenario, timing: &TimingSettings, show_code: bool) -> Result<()> {
    let display = Arc::new(TerminalDisplay::stdout(scenario.title.clone()));
    let simulator = Arc::new(TimerSimulator::from_settings(timing));
    let card = Card::new(scenario, simulator, display)?;

    if show_code && !card.code().is_empty() {
        println!("{}", card.render_code());
        println!();
    }

    card.start();
    let state = card.runner().wait().await;
    print_outcome(card.name(), &state);

    if !matches!(state.status, RunStatus::Succeeded { .. }) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_outcome(name: &str, state: &RunState) {
    let elapsed = state
        .elapsed
        .map(|e| format!("{}ms", e.as_millis()))
        .unwrap_or_else(|| "-".to_string());

    match &state.status {
        RunStatus::Succeeded { result } => {
            eprintln!("\n[{} succeeded in {}]", name, elapsed);
            if let Ok(pretty) = serde_json::to_string_pretty(result) {
                println!("{}", pretty);
            }
        }
        RunStatus::Failed { error } => {
            eprintln!("\n[{} failed after {}: {}]", name, elapsed, error);
        }
        other => {
            eprintln!("\n[{} in state: {}]", name, other.label());
        }
    }
}

/// Start every card at once, print the merged event stream, then a summary
async fn run_gallery(speed: Option<f64>) -> Result<()> {
    let (library, cfg) = load_library()?;
    let timing = timing(cfg, None, speed)?;
    let simulator = Arc::new(TimerSimulator::from_settings(&timing));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let mut cards = Vec::with_capacity(library.len());
    for scenario in library {
        let display = Arc::new(ChannelDisplay::new(scenario.name.clone(), sender.clone()));
        cards.push(Card::new(scenario, simulator.clone(), display)?);
    }
    drop(sender);

    for card in &cards {
        card.start();
    }

    let mut settled = HashSet::new();
    while settled.len() < cards.len() {
        let Some(event) = receiver.recv().await else {
            break;
        };

        match &event.kind {
            EventKind::Status { status, attempt } => println!(
                "{:<24} {}",
                event.card,
                crate::adapters::terminal::describe_status(status, *attempt)
            ),
            EventKind::Step {
                index,
                name,
                status,
            } => println!("{:<24}   {}. {} {:?}", event.card, index + 1, name, status),
        }

        if event.is_terminal() {
            settled.insert(event.card.clone());
        }
    }

    println!();
    println!("{:<24} {:<10} {:<10} {:<30}", "CARD", "STATUS", "ELAPSED", "RESULT");
    println!("{}", "-".repeat(76));

    for card in &cards {
        let state = card.state();
        let elapsed = state
            .elapsed
            .map(|e| format!("{}ms", e.as_millis()))
            .unwrap_or_else(|| "-".to_string());
        let detail = match &state.status {
            RunStatus::Succeeded { result } => truncate(&result.to_string(), 30),
            RunStatus::Failed { error } => truncate(&error.to_string(), 30),
            _ => String::new(),
        };
        println!(
            "{:<24} {:<10} {:<10} {:<30}",
            card.name(),
            state.status.label(),
            elapsed,
            detail
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Show resolved configuration, re-read from disk and environment
fn show_config() -> Result<()> {
    let cfg = config::reload_config()?;

    println!("async-gallery configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Timing:");
    println!("  Speed: {}x", cfg.timing.speed);
    println!(
        "  Seed:  {}",
        cfg.timing
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(random)".to_string())
    );
    println!();
    println!("Scenarios:");
    println!(
        "  Extra directory: {}",
        cfg.scenarios_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in only)".to_string())
    );
    println!();
    println!("Display:");
    println!("  Show code: {}", cfg.show_code);

    Ok(())
}
