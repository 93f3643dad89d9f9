use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CarwatchError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub host: HostConfig,
    pub rules: RulesConfig,
    pub anomaly: AnomalyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CARWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CARWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            host: HostConfig::from_env_profiled(p),
            rules: RulesConfig::from_env_profiled(p),
            anomaly: AnomalyConfig::from_env_profiled(p),
        }
    }

    /// Reject values the host loop cannot run with.
    pub fn validate(&self) -> Result<(), CarwatchError> {
        if self.host.tick_interval_ms == 0 {
            return Err(CarwatchError::Config("TICK_INTERVAL_MS must be > 0".into()));
        }
        if self.anomaly.timeout_ms == 0 {
            return Err(CarwatchError::Config("ANOMALY_TIMEOUT_MS must be > 0".into()));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  host:     tick_interval_ms={}, seed={}",
            self.host.tick_interval_ms,
            self.host
                .simulator_seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(random)".to_string())
        );
        tracing::info!(
            "  rules:    thresholds={}",
            self.rules
                .thresholds_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        );
        tracing::info!(
            "  anomaly:  provider={}, model={}, configured={}",
            self.anomaly.provider,
            self.anomaly.gemini_model,
            self.anomaly.is_configured()
        );
    }
}

// ── Host loop ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub tick_interval_ms: u64,
    pub simulator_seed: Option<u64>,
}

impl HostConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            tick_interval_ms: profiled_env_u64(p, "TICK_INTERVAL_MS", 1000),
            simulator_seed: profiled_env_opt(p, "SIMULATOR_SEED").and_then(|v| v.parse().ok()),
        }
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Optional YAML file overriding the built-in thresholds.
    pub thresholds_path: Option<PathBuf>,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            thresholds_path: profiled_env_opt(p, "RULES_THRESHOLDS_PATH").map(PathBuf::from),
        }
    }
}

// ── External anomaly check ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// "none" or "gemini"
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub timeout_ms: u64,
}

impl AnomalyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "ANOMALY_PROVIDER", "none"),
            gemini_api_key: profiled_env_opt(p, "GEMINI_API_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_base_url: profiled_env_or(
                p,
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            timeout_ms: profiled_env_u64(p, "ANOMALY_TIMEOUT_MS", 5000),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "none" => true,
            "gemini" => self.gemini_api_key.is_some(),
            _ => false,
        }
    }
}
