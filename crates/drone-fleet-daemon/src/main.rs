use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use drone_fleet_core::fleet::seed_demo_fleet;
use drone_fleet_core::{Database, FleetConfig, Scheduler};

/// Runs the drone lifecycle scheduler against a fleet database.
#[derive(Debug, Parser)]
#[command(name = "drone-fleetd", version, about)]
struct Cli {
    /// Path to the TOML config file; defaults apply when it does not exist
    #[arg(short, long, default_value = "drone-fleet.toml")]
    config: PathBuf,

    /// Override database.path from the config file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Run a single lifecycle pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging.level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "drone-fleetd exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<FleetConfig> {
    let mut config = FleetConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    Ok(config)
}

/// `RUST_LOG` wins over the configured level when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("drone_fleet_core={level},drone_fleetd={level}"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli, config: FleetConfig) -> Result<()> {
    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))?;

    if config.seed.demo_catalog && seed_demo_fleet(&db).context("seeding demo fleet")? {
        info!("Empty database seeded with the demo fleet");
    }

    let scheduler = Scheduler::new(Arc::new(Mutex::new(db)), &config);

    if cli.once {
        let report = tokio::task::spawn_blocking(move || scheduler.run_tick())
            .await
            .context("lifecycle pass panicked")??;
        info!(
            advanced = report.advanced,
            unchanged = report.unchanged,
            failed = report.failed,
            "Single lifecycle pass complete"
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    let ticks = handle.await.context("scheduler task panicked")?;
    info!(ticks, "drone-fleetd stopped");
    Ok(())
}
