//! CTF Match Simulator - Entry Point
//!
//! Command-line front end over the workbench:
//!
//! - `simulate <FILE>`: import an order document, settle it, print the report
//! - `watch <FILE>`: recompute every time the document changes
//! - `export <IN> <OUT>`: rewrite a document in the current format
//! - `options <SIDE> <TOKEN>`: list the maker legs a taker can settle against
//!
//! Wiring sequence:
//! 1. Parse CLI arguments
//! 2. Load config.toml (defaults when absent) + validate
//! 3. Init tracing to stderr (JSON or compact)
//! 4. Run the subcommand; reports go to stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctf_match_simulator::adapters::persistence::JsonFileStore;
use ctf_match_simulator::adapters::report::TextReport;
use ctf_match_simulator::adapters::watch::OrderWatcher;
use ctf_match_simulator::config::{AppConfig, loader};
use ctf_match_simulator::domain::arithmetic::{compatible_maker_legs, derive_match_type};
use ctf_match_simulator::domain::{Side, SideToken, Token};
use ctf_match_simulator::usecases::{SettlementResult, Workbench};

#[derive(Parser, Debug)]
#[command(name = "ctf-match-simulator", version)]
#[command(about = "Replay CTF exchange matches and check that settlement balances")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Settle one order document and print the result
    Simulate {
        /// Order document (takerOrder + makerOrders)
        file: PathBuf,
        /// Print the full result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Recompute whenever the order document changes
    Watch {
        /// Order document to poll
        file: PathBuf,
    },
    /// Re-export a document, converting legacy tokenId fields
    Export {
        /// Source document
        input: PathBuf,
        /// Destination document
        output: PathBuf,
    },
    /// List the maker legs that can settle against a taker
    Options {
        /// BUY or SELL
        side: Side,
        /// YES or NO
        token: Token,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let (config, found) = loader::load_config_or_default(&cli.config)
        .context("Failed to load configuration")?;

    // ── 2. Initialize logging (stderr) ──────────────────────
    init_tracing(&config);

    info!(
        name = %config.simulator.name,
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        config_found = found,
        "Starting CTF match simulator"
    );

    // ── 3. Dispatch ─────────────────────────────────────────
    match cli.command {
        Command::Simulate { file, json } => simulate(&config, &file, json),
        Command::Watch { file } => watch(&config, &file),
        Command::Export { input, output } => {
            export(&config, &input, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Options { side, token } => {
            print_options(SideToken::new(side, token));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.simulator.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.simulator.json_logs {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn simulate(config: &AppConfig, file: &Path, json: bool) -> Result<ExitCode> {
    let store = JsonFileStore::new(file);
    let mut bench = Workbench::new(&config.limits);
    bench.import(&store)?;

    let result = bench.compute();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        print!("{}", TextReport::new(&config.report).render(&result));
    }

    Ok(exit_code(&result))
}

fn watch(config: &AppConfig, file: &Path) -> ! {
    let mut bench = Workbench::new(&config.limits);
    let report = TextReport::new(&config.report);
    let mut watcher = OrderWatcher::new(file, &config.watch);

    watcher.run(&mut bench, |result| {
        println!("{}", report.render(result));
    })
}

fn export(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let mut bench = Workbench::new(&config.limits);
    bench.import(&JsonFileStore::new(input))?;
    bench.export(&JsonFileStore::new(output))
}

fn print_options(taker: SideToken) {
    let (maker_label, taker_label) = taker.amount_labels();
    println!("Taker {taker}: makerAmount = {maker_label}, takerAmount = {taker_label}");
    for leg in compatible_maker_legs(taker) {
        let (maker_label, taker_label) = leg.amount_labels();
        println!(
            "  {leg} ({}): makerAmount = {maker_label}, takerAmount = {taker_label}",
            derive_match_type(taker.side, leg.side)
        );
    }
}

const fn exit_code(result: &SettlementResult) -> ExitCode {
    match &result.summary {
        Some(summary) if !summary.success => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
