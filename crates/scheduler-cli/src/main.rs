//! scheduler-cli - Manufacturing job scheduling engine CLI
//!
//! Command-line interface for running one scheduling pass against a
//! SQLite-backed inventory of jobs, tasks, resources, and calendar rules.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scheduler_orchestrator::run;
use scheduler_store::SqliteStore;

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(author, version, about = "Manufacturing job scheduling engine", long_about = None)]
struct Cli {
    /// Path to the SQLite database holding job/task/resource/calendar tables
    #[arg(long, value_name = "PATH")]
    db: std::path::PathBuf,

    /// First calendar day the schedule may start on (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    start_date: Option<NaiveDate>,

    /// Wall-clock solve budget in seconds
    #[arg(long, default_value_t = scheduler_solver::DEFAULT_BUDGET_SECONDS)]
    budget_seconds: u64,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let start_date = cli.start_date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let store = SqliteStore::open(&cli.db)
        .with_context(|| format!("failed to open database at '{}'", cli.db.display()))?;

    let schedule = run(&store, start_date, cli.budget_seconds).map_err(|e| anyhow::anyhow!(e))?;

    println!(
        "Scheduled {} tasks, makespan = {} working minutes ({})",
        schedule.entries.len(),
        schedule.makespan_minutes,
        if schedule.proven_optimal { "proven optimal" } else { "best found within budget" }
    );
    for entry in &schedule.entries {
        println!(
            "  {:<12} {} -> {}  [{}]",
            entry.task_number, entry.start_time, entry.end_time, entry.resources_used
        );
    }

    Ok(())
}
