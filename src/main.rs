//! Flightline main entry point
//!
//! One process runs one job; the three jobs are deployed as separate
//! processes with their own sessions and cadences.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use flightline::config::{load_from_env, validate};
use flightline::extract::{ARRIVAL_COLUMNS, MOVEMENT_COLUMNS, TRANSFER_COLUMNS};
use flightline::pipeline::{ArrivalsJob, CycleScheduler, LdmJob, MovementsJob};
use flightline::sink::SqliteSink;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Flightline: incremental sync of flight ops data from a legacy portal
#[derive(Parser, Debug)]
#[command(name = "flightline")]
#[command(version = "1.0.0")]
#[command(about = "Session-backed incremental flight-data sync", long_about = None)]
struct Cli {
    /// Which sync job this process runs
    #[arg(value_enum)]
    job: JobKind,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the job's cycle interval, in minutes
    #[arg(long, value_name = "MINUTES")]
    interval_minutes: Option<u64>,

    /// Override the database path from the environment
    #[arg(long, value_name = "PATH")]
    database: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum JobKind {
    Arrivals,
    Ldm,
    Movements,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Honor a .env file when present; real environment wins
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if let Some(minutes) = cli.interval_minutes {
        config.pipeline.interval_minutes = Some(minutes);
    }
    if let Some(path) = cli.database {
        config.sink.database_path = path;
    }
    validate(&config)?;

    // A source layout change must fail at startup, not misassign fields
    // mid-cycle
    for map in [&ARRIVAL_COLUMNS, &TRANSFER_COLUMNS, &MOVEMENT_COLUMNS] {
        map.validate()?;
    }

    let sink = SqliteSink::new(Path::new(&config.sink.database_path))
        .with_context(|| format!("cannot open sink database {}", config.sink.database_path))?;

    let interval = config
        .pipeline
        .interval_minutes
        .map(|m| Duration::from_secs(m * 60));

    tracing::info!("Starting {:?} job against {}", cli.job, config.portal.base_url);
    match cli.job {
        JobKind::Arrivals => {
            CycleScheduler::new(ArrivalsJob::new(config, sink), interval)
                .run_forever()
                .await?
        }
        JobKind::Ldm => {
            CycleScheduler::new(LdmJob::new(config, sink), interval)
                .run_forever()
                .await?
        }
        JobKind::Movements => {
            CycleScheduler::new(MovementsJob::new(config, sink), interval)
                .run_forever()
                .await?
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flightline=info,warn"),
            1 => EnvFilter::new("flightline=debug,info"),
            2 => EnvFilter::new("flightline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
