//! Trigger thresholds and escalation limits for every rule.
//!
//! The defaults reproduce the built-in rule table. A YAML document may
//! override any subset; missing sections and keys keep their defaults:
//!
//! ```yaml
//! engine_temp:
//!   above_c: 110
//! fluids:
//!   escalate_after: 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RuleError};

/// Diagnostic codes counted by the error-code rule.
pub const DEFAULT_WATCHED_CODES: [&str; 5] = ["P0301", "P0700", "P0701", "P0702", "P0703"];

/// Upper bound of the 1–10 gear and fluid scales.
const SCALE_MAX: u8 = 10;

// ── Per-rule sections ───────────────────────────────────────────────

/// Engine temperature: triggers strictly above `above_c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineTempThresholds {
    pub above_c: i32,
    pub escalate_after: u32,
}

impl Default for EngineTempThresholds {
    fn default() -> Self {
        Self {
            above_c: 105,
            escalate_after: 5,
        }
    }
}

/// Error codes: stateless, Critical once `frequent_at` watched codes are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorCodeThresholds {
    pub watched: Vec<String>,
    pub frequent_at: usize,
}

impl Default for ErrorCodeThresholds {
    fn default() -> Self {
        Self {
            watched: DEFAULT_WATCHED_CODES.iter().map(|c| c.to_string()).collect(),
            frequent_at: 3,
        }
    }
}

impl ErrorCodeThresholds {
    /// Number of watched codes in `codes`, counting repeats.
    pub fn count_matches(&self, codes: &[String]) -> usize {
        codes
            .iter()
            .filter(|code| self.watched.iter().any(|w| w == *code))
            .count()
    }
}

/// Gear smoothness: triggers at or above `rough_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GearThresholds {
    pub rough_at: u8,
    pub escalate_after: u32,
}

impl Default for GearThresholds {
    fn default() -> Self {
        Self {
            rough_at: 7,
            escalate_after: 3,
        }
    }
}

/// Acceleration sound: triggers at or above `loud_at_db`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoundThresholds {
    pub loud_at_db: i32,
    pub escalate_after: u32,
}

impl Default for SoundThresholds {
    fn default() -> Self {
        Self {
            loud_at_db: 85,
            escalate_after: 4,
        }
    }
}

/// Shared by transmission oil, engine oil and coolant: triggers at or below `low_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluidThresholds {
    pub low_at: u8,
    pub escalate_after: u32,
}

impl Default for FluidThresholds {
    fn default() -> Self {
        Self {
            low_at: 3,
            escalate_after: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeakThresholds {
    pub escalate_after: u32,
}

impl Default for LeakThresholds {
    fn default() -> Self {
        Self { escalate_after: 1 }
    }
}

// ── Top-level document ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleThresholds {
    pub engine_temp: EngineTempThresholds,
    pub error_codes: ErrorCodeThresholds,
    pub gear: GearThresholds,
    pub accel_sound: SoundThresholds,
    pub fluids: FluidThresholds,
    pub leakage: LeakThresholds,
}

impl RuleThresholds {
    /// Parse and validate a YAML threshold document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let thresholds: Self = serde_yaml::from_str(yaml)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Read, parse and validate a YAML threshold file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading rule thresholds");
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check that every limit can be reached and every scale value is in range.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("engine_temp.escalate_after", self.engine_temp.escalate_after),
            ("gear.escalate_after", self.gear.escalate_after),
            ("accel_sound.escalate_after", self.accel_sound.escalate_after),
            ("fluids.escalate_after", self.fluids.escalate_after),
            ("leakage.escalate_after", self.leakage.escalate_after),
        ];
        for (name, limit) in limits {
            if limit == 0 {
                return Err(RuleError::Validation(format!("{} must be at least 1", name)));
            }
        }

        if self.error_codes.frequent_at == 0 {
            return Err(RuleError::Validation(
                "error_codes.frequent_at must be at least 1".to_string(),
            ));
        }

        if !(1..=SCALE_MAX).contains(&self.gear.rough_at) {
            return Err(RuleError::Validation(format!(
                "gear.rough_at must be within 1..={}, got {}",
                SCALE_MAX, self.gear.rough_at
            )));
        }

        if !(1..=SCALE_MAX).contains(&self.fluids.low_at) {
            return Err(RuleError::Validation(format!(
                "fluids.low_at must be within 1..={}, got {}",
                SCALE_MAX, self.fluids.low_at
            )));
        }

        Ok(())
    }
}
