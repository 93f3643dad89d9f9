mod cli;
mod monitor;
mod terminal;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use carwatch_core::config::{load_dotenv, Config};
use carwatch_ingest::{ReplaySource, Simulator, TelemetrySource};
use carwatch_llm::create_detector;
use carwatch_rules::{Engine, RuleThresholds};

use crate::cli::CliArgs;
use crate::monitor::{Monitor, StopReason};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries verdicts only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    load_dotenv();
    let mut config = Config::from_env();
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let engine = match config.rules.thresholds_path {
        Some(ref path) => {
            let thresholds = RuleThresholds::load(path)
                .with_context(|| format!("failed to load thresholds from {}", path.display()))?;
            Engine::with_thresholds(thresholds)
        }
        None => Engine::new(),
    };

    let (source, source_label): (Box<dyn TelemetrySource + Send>, String) = match args.replay {
        Some(ref path) => {
            let replay = ReplaySource::open(path)
                .with_context(|| format!("failed to open replay file {}", path.display()))?;
            (Box::new(replay), format!("replay {}", path.display()))
        }
        None => match config.host.simulator_seed {
            Some(seed) => (Box::new(Simulator::seeded(seed)), format!("simulator (seed {})", seed)),
            None => (Box::new(Simulator::from_entropy()), "simulator".to_string()),
        },
    };

    let detector =
        create_detector(&config.anomaly).context("failed to create anomaly detector")?;

    let terminal = Terminal::new(args.format());
    terminal.print_banner(&source_label, &config.anomaly.provider)?;

    let mut monitor = Monitor::new(
        source,
        detector,
        engine,
        Duration::from_millis(config.anomaly.timeout_ms),
    );

    let period = Duration::from_millis(config.host.tick_interval_ms);
    let (_, reason) = monitor
        .run(period, args.tick_limit(), shutdown_signal(), |report| {
            terminal.display(report)
        })
        .await?;

    match reason {
        StopReason::Exhausted => terminal.print_info("Telemetry source exhausted.")?,
        StopReason::Interrupted => info!("Interrupted, stopping"),
        StopReason::TickLimit => {}
    }
    Ok(())
}

/// Resolve on the first Ctrl-C. The handler is installed once for the
/// whole run.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
