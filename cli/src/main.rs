//! Command-line front end for the co-op cash ledger.
//!
//! Operates on a snapshot JSON file (see `StateSnapshot`): print balances,
//! force a reconciliation, re-derive the cash chain, or query balances as
//! of a past date.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coop_cash_engine::{EventDate, LedgerState, StateSnapshot};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "coop-cash", about = "Co-op cash ledger tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print current balances (ledger and display granularity).
    Balances {
        /// Snapshot JSON file
        file: PathBuf,
    },

    /// Recompute every balance from full history and report drift from the
    /// stored cache.
    Recompute {
        /// Snapshot JSON file
        file: PathBuf,

        /// Write the reconciled snapshot back to the file
        #[arg(long)]
        write: bool,
    },

    /// Print the re-derived cash chain, oldest first.
    Chain {
        /// Snapshot JSON file
        file: PathBuf,
    },

    /// Print balances as they stood at the end of a date.
    AsOf {
        /// Snapshot JSON file
        file: PathBuf,

        /// Query date, YYYY-MM-DD
        date: String,
    },
}

fn load_state(path: &Path) -> Result<LedgerState> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read snapshot file {}", path.display()))?;
    let snapshot: StateSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid ledger snapshot", path.display()))?;
    Ok(LedgerState::restore(snapshot))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Balances { file } => {
            let state = load_state(&file)?;
            println!("{:<20} {:>12} {:>10}", "participant", "balance", "display");
            for participant in state.participants() {
                let display = state.display_balances()[&participant.id];
                println!(
                    "{:<20} {:>12.2} {:>10.1}",
                    participant.display_name, participant.balance, display
                );
            }
        }

        Command::Recompute { file, write } => {
            let mut state = load_state(&file)?;
            let cached = state.balances();
            state.recompute_and_apply();

            let mut drifted = 0usize;
            for (id, balance) in state.balances() {
                let old = cached[&id];
                if (old - balance).abs() > 1e-9 {
                    println!("{}: cached {} -> recomputed {}", id, old, balance);
                    drifted += 1;
                }
            }
            if drifted == 0 {
                println!("books are consistent: cache matches the fold");
            } else {
                println!("{} balance(s) drifted from the fold", drifted);
            }

            if write {
                let json = serde_json::to_string_pretty(&state.snapshot())?;
                fs::write(&file, json)
                    .with_context(|| format!("cannot write {}", file.display()))?;
                println!("reconciled snapshot written to {}", file.display());
            }
        }

        Command::Chain { file } => {
            let state = load_state(&file)?;
            println!(
                "{:<12} {:>10} {:>10} {:>10} {:>7}",
                "date", "found", "supplier", "left", "closed"
            );
            for delivery in state.deliveries() {
                println!(
                    "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>7}",
                    delivery.date,
                    delivery.cash_found,
                    delivery.cash_paid_to_supplier,
                    delivery.cash_left,
                    delivery.closed
                );
            }
        }

        Command::AsOf { file, date } => {
            let state = load_state(&file)?;
            let as_of = EventDate::new(date).context("invalid query date")?;
            for (id, balance) in state.historical_balances(&as_of) {
                println!("{:<20} {:>12.2}", id, balance);
            }
        }
    }

    Ok(())
}
