//! Town simulation runner.
//!
//! - `town-sim run <scenario>` - load a YAML/JSON scenario, step it and print a summary
//! - `town-sim sample` - print the built-in sample scenario as YAML

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use ai_behavior::Scenario;

#[derive(Parser)]
#[command(name = "town-sim")]
#[command(about = "Headless town simulation", version)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Scenario file (.yaml, .yml or .json)
        scenario: PathBuf,

        /// Number of steps
        #[arg(long, default_value_t = 600)]
        steps: u64,

        /// Seconds per step
        #[arg(long, default_value_t = 0.1)]
        dt: f32,

        /// Override the scenario's seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        summary_json: bool,

        /// Print every agent's state machine events
        #[arg(long)]
        trace: bool,
    },

    /// Print the sample scenario
    Sample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json);

    match cli.command {
        Commands::Run {
            scenario,
            steps,
            dt,
            seed,
            summary_json,
            trace,
        } => {
            let mut scenario = load_scenario(&scenario)?;
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            run(&scenario, steps, dt, summary_json, trace)
        }
        Commands::Sample => {
            let yaml = serde_yaml::to_string(&Scenario::sample())
                .context("failed to serialize sample scenario")?;
            print!("{yaml}");
            Ok(())
        }
    }
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse YAML scenario {}", path.display())),
        "json" => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse JSON scenario {}", path.display())),
        other => bail!("unsupported scenario extension `{other}` (expected yaml, yml or json)"),
    }
}

fn run(scenario: &Scenario, steps: u64, dt: f32, summary_json: bool, trace: bool) -> Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        bail!("--dt must be positive, got {dt}");
    }
    let mut sim = scenario
        .build_traced(trace)
        .context("failed to build scenario")?;

    tracing::info!(steps, dt, seed = sim.seed(), "running");
    sim.run(steps, dt);

    let summary = sim.summary();
    if summary_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
        );
    } else {
        print!("{summary}");
    }

    if trace {
        for agent in sim.agents() {
            if let Some(log) = sim.trace(agent.id) {
                let line = serde_json::json!({ "agent": agent.id, "events": log });
                println!("{line}");
            }
        }
    }
    Ok(())
}
