//! Username hygiene CLI
//!
//! Repairs duplicate and denylisted usernames in a SQLite `users` table.
//! By default both sweeps run, denylist first — a denylist rename can mint
//! a fresh duplicate, which the duplicate sweep then picks up.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use username_dedup::manager::ResolutionManager;
use username_dedup::store::sqlite::SqliteStore;
use username_dedup::types::{ResolutionOutcome, ResolveOptions, Strategy};

#[derive(Parser, Debug)]
#[command(name = "username-dedup")]
#[command(version)]
#[command(about = "Repair duplicate and denylisted usernames in a users table", long_about = None)]
struct Args {
    /// Path to the SQLite database holding the users table
    #[arg(value_name = "DB_PATH")]
    db: PathBuf,

    /// Show what would change without writing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Rename strategy for duplicate usernames
    #[arg(long, value_enum, default_value_t = StrategyArg::Sequential)]
    strategy: StrategyArg,

    /// Maximum number of resolution passes before giving up
    #[arg(long, default_value = "10")]
    max_passes: u32,

    /// Only resolve duplicate usernames
    #[arg(long)]
    duplicates_only: bool,

    /// Only resolve denylisted usernames
    #[arg(long)]
    denylisted_only: bool,

    /// Create the users/denylist schema if it does not exist
    #[arg(long)]
    init_schema: bool,

    /// Emit one JSON object per rename instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Sequential,
    Random,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Random => Strategy::Random,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.duplicates_only && args.denylisted_only {
        bail!("--duplicates-only and --denylisted-only are mutually exclusive");
    }

    let store = SqliteStore::open(&args.db)?;
    if args.init_schema {
        store.initialize()?;
    }

    let options = ResolveOptions {
        strategy: args.strategy.into(),
        max_passes: args.max_passes,
    };
    let manager = ResolutionManager::with_options(store, options);

    let mut total_renamed = 0;
    let mut total_passes = 0;

    if !args.duplicates_only {
        let outcome = manager.resolve_denylisted(args.dry_run)?;
        report(&outcome, args.json)?;
        total_renamed += outcome.renamed.len();
        total_passes += outcome.passes;
    }
    if !args.denylisted_only {
        let outcome = manager.resolve_duplicates(args.dry_run)?;
        report(&outcome, args.json)?;
        total_renamed += outcome.renamed.len();
        total_passes += outcome.passes;
    }

    let verb = if args.dry_run { "Would rename" } else { "Renamed" };
    println!("{verb} {total_renamed} users in {total_passes} passes");

    Ok(())
}

/// One line per affected user: id and resolved name.
fn report(outcome: &ResolutionOutcome, json: bool) -> Result<()> {
    for entry in &outcome.renamed {
        if json {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            println!("Id: {} ResolvedName: {}", entry.id, entry.new_username);
        }
    }
    Ok(())
}
