//! Grid balancer entry point: CLI wiring, logging setup, and engine lifecycle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use grid_balancer::config::ScenarioConfig;
use grid_balancer::io::export::export_csv;
use grid_balancer::reporting::{HttpReporter, NullReporter, Reporter};
use grid_balancer::sim::engine::Engine;

/// Concurrent power-grid simulator with greedy substation load rebalancing.
#[derive(Parser, Debug)]
#[command(name = "grid-balancer", version, about)]
struct Args {
    /// Load scenario from a TOML config file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, peak_demand)
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Override the grid generation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the run duration in seconds
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Log filter, e.g. "debug" or "grid_balancer=trace" (overrides RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Write the final node snapshot to CSV
    #[arg(long, value_name = "PATH")]
    snapshot_out: Option<PathBuf>,

    /// Serve the status API while the simulation runs
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// `--scenario` takes priority, then `--preset`, then the baseline preset.
fn load_scenario(args: &Args) -> anyhow::Result<ScenarioConfig> {
    let mut scenario = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };

    if let Some(seed) = args.seed {
        scenario.grid.seed = seed;
    }
    if let Some(secs) = args.duration {
        scenario.simulation.duration_secs = secs;
    }
    Ok(scenario)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let scenario = load_scenario(&args)?;
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }

    if scenario.reporting.enabled {
        let reporter =
            HttpReporter::new(&scenario.reporting).context("failed to build HTTP client")?;
        info!(endpoint = reporter.endpoint(), "reporting to external service");
        run(&scenario, reporter, &args).await
    } else {
        info!("reporting disabled");
        run(&scenario, NullReporter, &args).await
    }
}

async fn run<R: Reporter>(
    scenario: &ScenarioConfig,
    reporter: R,
    args: &Args,
) -> anyhow::Result<()> {
    let mut engine = Engine::new(scenario, reporter)?;

    #[cfg(feature = "api")]
    let server = args.serve.then(|| {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(grid_balancer::api::AppState {
            grid: engine.grid(),
            overload_threshold: scenario.grid.overload_threshold,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        tokio::spawn(async move {
            if let Err(e) = grid_balancer::api::serve(state, addr).await {
                error!(error = %e, "API server failed");
            }
        })
    });

    engine.start()?;

    let duration = scenario.simulation.duration();
    info!(secs = duration.as_secs(), "simulation running");
    wait_for_shutdown(duration).await;

    engine.stop().await;

    #[cfg(feature = "api")]
    if let Some(server) = server {
        server.abort();
    }

    if let Some(path) = &args.snapshot_out {
        write_snapshot(&engine, path)?;
    }

    info!("simulation completed");
    Ok(())
}

/// Returns when `duration` elapses or Ctrl-C arrives, whichever is first.
async fn wait_for_shutdown(duration: Duration) {
    tokio::select! {
        () = tokio::time::sleep(duration) => info!("run duration elapsed"),
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                warn!(error = %e, "cannot listen for shutdown signal, running full duration");
                tokio::time::sleep(duration).await;
            }
        },
    }
}

fn write_snapshot<R: Reporter>(engine: &Engine<R>, path: &Path) -> anyhow::Result<()> {
    export_csv(&engine.nodes(), path)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}
