//! Headless simulation runner.
//!
//! Runs the simulation without graphics and prints a JSON summary to
//! stdout. Designed for CI verification and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in skirmish scenario
//! cargo run -p flotilla_headless -- run
//!
//! # Run a scenario file with the distance-field backend for 2000 ticks
//! cargo run -p flotilla_headless -- run --scenario march.ron --ticks 2000
//!
//! # Print a scenario's final state hash twice to spot-check determinism
//! cargo run -p flotilla_headless -- verify --runs 4
//! ```
//!
//! Output (stdout): one JSON document.
//! Logs (stderr): tracing output, `-v` for debug level.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flotilla_headless::runner::HeadlessRunner;
use flotilla_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "flotilla_headless")]
#[command(about = "Headless Flotilla simulation runner for CI and determinism checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario and print its summary
    Run {
        /// Scenario file to load (defaults to the built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's tick budget
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Run a scenario several times and verify the state hashes match
    Verify {
        /// Scenario file to load (defaults to the built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of repeat runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Scenario::load(path)?),
        None => Ok(Scenario::skirmish()),
    }
}

fn run_once(scenario: Scenario) -> Result<u64, Box<dyn std::error::Error>> {
    let mut runner = HeadlessRunner::new(scenario)?;
    let summary = runner.run()?;
    let hash = summary.state_hash;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(hash)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let result = match cli.command {
        Commands::Run { scenario, ticks } => load_scenario(scenario.as_ref()).and_then(|mut s| {
            if let Some(ticks) = ticks {
                s.ticks = ticks;
            }
            run_once(s).map(|_| ())
        }),

        Commands::Verify { scenario, runs } => load_scenario(scenario.as_ref()).and_then(|s| {
            let mut hashes = Vec::new();
            for _ in 0..runs.max(1) {
                let mut runner = HeadlessRunner::new(s.clone())?;
                hashes.push(runner.run()?.state_hash);
            }

            if hashes.windows(2).all(|w| w[0] == w[1]) {
                println!(
                    "{}",
                    serde_json::json!({ "deterministic": true, "runs": runs, "state_hash": hashes[0] })
                );
                Ok(())
            } else {
                Err(format!("state hashes diverged: {hashes:?}").into())
            }
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
