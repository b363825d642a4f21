//! CLI interface for gatepass.
//!
//! Non-interactive: arguments in, plain text out. A scanner front end pipes
//! decoded QR content into `gatepass verify`.
//!
//! - `gatepass fleet vessels|drivers` — the fleet and today's trip counts.
//! - `gatepass pass vessel|driver <id>` — print the QR payload to encode.
//! - `gatepass verify <driver-pass> <vessel-pass>` — run a checkpoint session.
//! - `gatepass trips` — trips recorded on an operating day.

mod fleet;
mod format;
mod pass;
mod trips;
mod verify;

use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatepass::{Checkpoint, Config, Fleet, OperatingCalendar, SqliteLedger};

use fleet::FleetCommand;
use pass::PassCommand;

/// gatepass — trip-limited gate passes for a rafting fleet.
#[derive(Debug, Parser)]
#[command(name = "gatepass", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Log session and ledger activity to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: a morning at the put-in
  1. gatepass pass driver D01     → print the driver's ID card payload
  2. gatepass pass vessel B-101   → print the boat's sail pass payload
  3. gatepass verify "$DRIVER_QR" "$VESSEL_QR"
     → SAIL ALLOWED / SAIL DENIED, with the trip count for today
  4. gatepass verify --commit "$DRIVER_QR" "$VESSEL_QR"
     → records the trip when allowed
  5. gatepass trips               → what left the checkpoint today"#;

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect the fleet directory.
    Fleet {
        #[command(subcommand)]
        command: FleetCommand,
    },

    /// Print gate pass payloads for QR encoding.
    Pass {
        #[command(subcommand)]
        command: PassCommand,
    },

    /// Verify a driver card and a sail pass, optionally recording the trip.
    Verify {
        /// Scanned driver ID card payload (JSON).
        driver: String,

        /// Scanned vessel sail pass payload (JSON).
        vessel: String,

        /// Record the trip if the sail is allowed.
        #[arg(long)]
        commit: bool,
    },

    /// List trips recorded on an operating day.
    Trips {
        /// Operating day as YYYY-MM-DD (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let fleet = Arc::new(load_fleet(config)?);
    let ledger = Arc::new(open_ledger(config)?);
    let checkpoint = Checkpoint::new(fleet.clone(), fleet.clone(), ledger);

    match cli.command {
        Command::Fleet { command } => match command {
            FleetCommand::Vessels => fleet::cmd_vessels(&fleet, &checkpoint),
            FleetCommand::Drivers { search } => fleet::cmd_drivers(&fleet, search.as_deref()),
        },
        Command::Pass { command } => match command {
            PassCommand::Vessel { id } => pass::cmd_vessel(&fleet, &checkpoint, &id),
            PassCommand::Driver { id } => pass::cmd_driver(&fleet, &checkpoint, &id),
        },
        Command::Verify {
            driver,
            vessel,
            commit,
        } => verify::cmd_verify(&checkpoint, &driver, &vessel, commit),
        Command::Trips { date } => trips::cmd_trips(&fleet, &checkpoint, date.as_deref()),
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Load the configured fleet file, or the demo fleet if there is none.
fn load_fleet(config: &Config) -> Result<Fleet, String> {
    let Some(path) = config.fleet_path() else {
        return Ok(Fleet::sample());
    };
    let contents = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no fleet file; using demo fleet");
            return Ok(Fleet::sample());
        }
        Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
    };
    Fleet::from_toml(&contents).map_err(|e| format!("{}: {e}", path.display()))
}

fn open_ledger(config: &Config) -> Result<SqliteLedger, String> {
    let path = config
        .ledger_path()
        .ok_or("could not determine home directory")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    let calendar = OperatingCalendar::new(config.timezone()?);
    SqliteLedger::open(&path, calendar, config.max_trips_per_day)
        .map_err(|e| format!("failed to open ledger at {}: {e}", path.display()))
}
