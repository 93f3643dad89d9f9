use std::path::PathBuf;

use clap::Parser;

use carwatch_core::Config;

/// Vehicle health monitor.
///
/// Pulls one telemetry reading per tick, optionally asks an LLM for
/// unusual patterns, and prints the rule engine's verdict.
#[derive(Parser, Debug)]
#[command(name = "carwatch", about = "Debounced vehicle health monitor")]
pub struct CliArgs {
    /// Number of ticks to run (0 = until Ctrl-C)
    #[arg(long, default_value = "0")]
    pub ticks: u64,

    /// Tick period in milliseconds (overrides TICK_INTERVAL_MS)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Seed for the telemetry simulator (overrides SIMULATOR_SEED)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Replay readings from a JSON-lines file instead of simulating
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// YAML file with rule thresholds (overrides RULES_THRESHOLDS_PATH)
    #[arg(long)]
    pub thresholds: Option<PathBuf>,

    /// External anomaly provider: none or gemini (overrides ANOMALY_PROVIDER)
    #[arg(long)]
    pub anomaly: Option<String>,

    /// Anomaly check timeout in milliseconds (overrides ANOMALY_TIMEOUT_MS)
    #[arg(long)]
    pub anomaly_timeout_ms: Option<u64>,

    /// Print one JSON object per tick instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliArgs {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Tick limit, `None` when running until interrupted.
    pub fn tick_limit(&self) -> Option<u64> {
        (self.ticks > 0).then_some(self.ticks)
    }

    /// Overlay command-line flags on the environment config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(ms) = self.interval_ms {
            config.host.tick_interval_ms = ms;
        }
        if let Some(seed) = self.seed {
            config.host.simulator_seed = Some(seed);
        }
        if let Some(ref path) = self.thresholds {
            config.rules.thresholds_path = Some(path.clone());
        }
        if let Some(ref provider) = self.anomaly {
            config.anomaly.provider = provider.to_lowercase();
        }
        if let Some(ms) = self.anomaly_timeout_ms {
            config.anomaly.timeout_ms = ms;
        }
    }
}
