//! Headless Oracle War battle runner.
//!
//! This binary runs a battle without graphics, controlled via JSON on
//! stdin/stdout, or plays it out with a scripted strategy.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p tactics_headless
//!
//! # Autoplay with the aggressive strategy, printing the board each round
//! cargo run -p tactics_headless -- autoplay --strategy aggressive --frames
//!
//! # Validate catalog and scenario files
//! cargo run -p tactics_headless -- --catalog assets/data validate
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tactics_core::data::Catalog;
use tactics_core::scenario::Scenario;
use tactics_core::turn::TurnController;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_headless::{
    ascii_visualizer::{render_board, AsciiConfig},
    catalog_loader::{load_scenario, CatalogLoadError, FileCatalogSource},
    runner::{HeadlessConfig, HeadlessRunner},
    strategies::{autoplay, Strategy},
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless Oracle War battle runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Catalog file or directory (defaults to the bundled data)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Scenario file (defaults to the built-in Oracle War battle)
    #[arg(short, long, global = true)]
    scenario: Option<PathBuf>,

    /// Override the scenario's random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive JSON-lines session
    Run {
        /// Output state after every applied command
        #[arg(long)]
        auto_state: bool,
    },

    /// Play the battle out with a scripted player strategy
    Autoplay {
        /// Player strategy
        #[arg(long, value_enum, default_value_t = Strategy::Aggressive)]
        strategy: Strategy,

        /// Stop after this many turns
        #[arg(long, default_value = "100")]
        max_turns: u32,

        /// Print the board after every round
        #[arg(long)]
        frames: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Load and validate the catalog and scenario, then exit
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let (catalog, scenario) = match load_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Commands::Run { auto_state: false }) {
        Commands::Run { auto_state } => cmd_run(catalog, scenario, auto_state),
        Commands::Autoplay {
            strategy,
            max_turns,
            frames,
            no_color,
        } => cmd_autoplay(catalog, scenario, strategy, max_turns, frames, no_color),
        Commands::Validate => cmd_validate(&catalog, scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_inputs(cli: &Cli) -> Result<(Arc<Catalog>, Scenario), CatalogLoadError> {
    let source = match &cli.catalog {
        Some(path) => FileCatalogSource::new(path),
        None => FileCatalogSource::from_default_dir()?,
    };
    let catalog = Arc::new(source.load_catalog()?);

    let mut scenario = match &cli.scenario {
        Some(path) => load_scenario(path)?,
        None => Scenario::oracle_war(),
    };
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    Ok((catalog, scenario))
}

fn cmd_run(catalog: Arc<Catalog>, scenario: Scenario, auto_state: bool) -> Result<(), String> {
    let config = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let mut runner = HeadlessRunner::new(catalog, scenario, config).map_err(|e| e.to_string())?;
    let stdin = io::stdin();
    runner
        .run(stdin.lock(), io::stdout().lock())
        .map_err(|e| e.to_string())
}

fn cmd_autoplay(
    catalog: Arc<Catalog>,
    scenario: Scenario,
    strategy: Strategy,
    max_turns: u32,
    frames: bool,
    no_color: bool,
) -> Result<(), String> {
    let mut tc = TurnController::new(catalog, scenario).map_err(|e| e.to_string())?;
    let config = AsciiConfig {
        use_color: !no_color,
        ..Default::default()
    };

    let report = autoplay(&mut tc, strategy, max_turns, |tc| {
        if frames {
            println!("{}", render_board(&tc.snapshot(), &config));
        }
    });

    println!("{}", render_board(&tc.snapshot(), &config));
    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn cmd_validate(catalog: &Arc<Catalog>, scenario: Scenario) -> Result<(), String> {
    let name = scenario.name.clone();
    let tc = TurnController::new(Arc::clone(catalog), scenario).map_err(|e| e.to_string())?;
    tracing::info!(
        scenario = %name,
        player_units = tc.snapshot().player_roster.len(),
        enemy_units = tc.snapshot().enemy_roster.len(),
        formations = tc.formations().len(),
        "Scenario is valid"
    );
    println!("OK: {name}");
    Ok(())
}
