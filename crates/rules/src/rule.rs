//! The fixed vehicle-health rule set.
//!
//! Each rule inspects one [`Reading`] and, for debounced rules, its own
//! [`HysteresisCounter`] in [`RuleState`]. A rule yields at most one
//! [`Outcome`]; `None` means the rule did not fire this tick.

use serde::{Deserialize, Serialize};

use carwatch_core::{Reading, Severity};

use crate::hysteresis::HysteresisCounter;
use crate::thresholds::RuleThresholds;

// ── Rule identity ───────────────────────────────────────────────────

/// Identifies a rule. Declaration order is evaluation and message order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    HighEngineTemp,
    SpecificErrorCodes,
    RoughGearChange,
    HighAccelSound,
    LowTransmissionOil,
    LowEngineOil,
    LowCoolant,
    Leakage,
    ExternalAnomaly,
}

impl RuleId {
    /// Every rule, in evaluation order.
    pub const ALL: [RuleId; 9] = [
        RuleId::HighEngineTemp,
        RuleId::SpecificErrorCodes,
        RuleId::RoughGearChange,
        RuleId::HighAccelSound,
        RuleId::LowTransmissionOil,
        RuleId::LowEngineOil,
        RuleId::LowCoolant,
        RuleId::Leakage,
        RuleId::ExternalAnomaly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::HighEngineTemp => "high-engine-temp",
            RuleId::SpecificErrorCodes => "specific-error-codes",
            RuleId::RoughGearChange => "rough-gear-change",
            RuleId::HighAccelSound => "high-accel-sound",
            RuleId::LowTransmissionOil => "low-transmission-oil",
            RuleId::LowEngineOil => "low-engine-oil",
            RuleId::LowCoolant => "low-coolant",
            RuleId::Leakage => "leakage",
            RuleId::ExternalAnomaly => "external-anomaly",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fired rule: its severity and explanation for this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: String,
}

impl Outcome {
    fn new(rule: RuleId, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity,
            message: message.into(),
        }
    }
}

// ── Per-rule counters ───────────────────────────────────────────────

/// Consecutive-violation counters for the debounced rules.
///
/// The error-code and external-anomaly rules are stateless and have none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleState {
    pub high_temp: HysteresisCounter,
    pub rough_gear: HysteresisCounter,
    pub high_sound: HysteresisCounter,
    pub low_transmission_oil: HysteresisCounter,
    pub low_engine_oil: HysteresisCounter,
    pub low_coolant: HysteresisCounter,
    pub leakage: HysteresisCounter,
}

impl RuleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a debounced rule; `None` for stateless rules.
    pub fn count(&self, rule: RuleId) -> Option<u32> {
        self.counter(rule).map(HysteresisCounter::count)
    }

    fn counter(&self, rule: RuleId) -> Option<&HysteresisCounter> {
        match rule {
            RuleId::HighEngineTemp => Some(&self.high_temp),
            RuleId::RoughGearChange => Some(&self.rough_gear),
            RuleId::HighAccelSound => Some(&self.high_sound),
            RuleId::LowTransmissionOil => Some(&self.low_transmission_oil),
            RuleId::LowEngineOil => Some(&self.low_engine_oil),
            RuleId::LowCoolant => Some(&self.low_coolant),
            RuleId::Leakage => Some(&self.leakage),
            RuleId::SpecificErrorCodes | RuleId::ExternalAnomaly => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Evaluation ──────────────────────────────────────────────────────

/// Run one rule against a reading, updating its counter if it has one.
pub fn evaluate_rule(
    rule: RuleId,
    reading: &Reading,
    state: &mut RuleState,
    thresholds: &RuleThresholds,
) -> Option<Outcome> {
    match rule {
        RuleId::HighEngineTemp => high_engine_temp(reading, &mut state.high_temp, thresholds),
        RuleId::SpecificErrorCodes => specific_error_codes(reading, thresholds),
        RuleId::RoughGearChange => rough_gear_change(reading, &mut state.rough_gear, thresholds),
        RuleId::HighAccelSound => high_accel_sound(reading, &mut state.high_sound, thresholds),
        RuleId::LowTransmissionOil => low_fluid(
            rule,
            reading.transmission_oil,
            &mut state.low_transmission_oil,
            thresholds,
            ("Transmission oil level low", "Low transmission oil level detected"),
        ),
        RuleId::LowEngineOil => low_fluid(
            rule,
            reading.engine_oil,
            &mut state.low_engine_oil,
            thresholds,
            ("Engine oil level low", "Low engine oil level detected"),
        ),
        RuleId::LowCoolant => low_fluid(
            rule,
            reading.coolant,
            &mut state.low_coolant,
            thresholds,
            ("Coolant level low", "Low coolant level detected"),
        ),
        RuleId::Leakage => leakage(reading, &mut state.leakage, thresholds),
        RuleId::ExternalAnomaly => external_anomaly(reading),
    }
}

/// Feed `triggered` into `counter` and map the count to a severity.
///
/// `None` when the condition does not hold; `Critical` once the count
/// reaches `limit`; `Warning` before that.
fn sustained(counter: &mut HysteresisCounter, triggered: bool, limit: u32) -> Option<Severity> {
    match counter.observe(triggered) {
        0 => None,
        count if count >= limit => Some(Severity::Critical),
        _ => Some(Severity::Warning),
    }
}

fn high_engine_temp(
    reading: &Reading,
    counter: &mut HysteresisCounter,
    thresholds: &RuleThresholds,
) -> Option<Outcome> {
    let t = &thresholds.engine_temp;
    let severity = sustained(counter, reading.engine_temp_c > t.above_c, t.escalate_after)?;
    let message = match severity {
        Severity::Critical => "Engine overheating detected for too long!".to_string(),
        _ => format!("High engine temp ({}°C).", reading.engine_temp_c),
    };
    Some(Outcome::new(RuleId::HighEngineTemp, severity, message))
}

fn specific_error_codes(reading: &Reading, thresholds: &RuleThresholds) -> Option<Outcome> {
    let t = &thresholds.error_codes;
    let count = t.count_matches(&reading.error_codes);
    if count == 0 {
        return None;
    }

    let outcome = if count >= t.frequent_at {
        Outcome::new(
            RuleId::SpecificErrorCodes,
            Severity::Critical,
            format!("Frequent specific errors detected ({} times).", count),
        )
    } else {
        Outcome::new(
            RuleId::SpecificErrorCodes,
            Severity::Warning,
            format!("Specific error codes detected ({} times).", count),
        )
    };
    Some(outcome)
}

fn rough_gear_change(
    reading: &Reading,
    counter: &mut HysteresisCounter,
    thresholds: &RuleThresholds,
) -> Option<Outcome> {
    let t = &thresholds.gear;
    let smoothness = reading.gear_smoothness;
    let severity = sustained(counter, smoothness >= t.rough_at, t.escalate_after)?;
    let message = match severity {
        Severity::Critical => format!(
            "Persistent rough gear changes detected (smoothness: {}).",
            smoothness
        ),
        _ => format!("Rough gear change detected (smoothness: {}).", smoothness),
    };
    Some(Outcome::new(RuleId::RoughGearChange, severity, message))
}

fn high_accel_sound(
    reading: &Reading,
    counter: &mut HysteresisCounter,
    thresholds: &RuleThresholds,
) -> Option<Outcome> {
    let t = &thresholds.accel_sound;
    let db = reading.accel_sound_db;
    let severity = sustained(counter, db >= t.loud_at_db, t.escalate_after)?;
    let message = match severity {
        Severity::Critical => format!("Excessive acceleration sound detected ({}dB).", db),
        _ => format!("High acceleration sound detected ({}dB).", db),
    };
    Some(Outcome::new(RuleId::HighAccelSound, severity, message))
}

/// Shared body of the three fluid-level rules.
///
/// `labels` is the (warning, critical) message prefix.
fn low_fluid(
    rule: RuleId,
    level: u8,
    counter: &mut HysteresisCounter,
    thresholds: &RuleThresholds,
    labels: (&str, &str),
) -> Option<Outcome> {
    let t = &thresholds.fluids;
    let severity = sustained(counter, level <= t.low_at, t.escalate_after)?;
    let label = match severity {
        Severity::Critical => labels.1,
        _ => labels.0,
    };
    Some(Outcome::new(rule, severity, format!("{} ({}/10).", label, level)))
}

fn leakage(
    reading: &Reading,
    counter: &mut HysteresisCounter,
    thresholds: &RuleThresholds,
) -> Option<Outcome> {
    let severity = sustained(
        counter,
        reading.leak_detected,
        thresholds.leakage.escalate_after,
    )?;
    let message = match severity {
        Severity::Critical => "Potential fluid leakage detected!",
        _ => "Possible fluid leakage detected.",
    };
    Some(Outcome::new(RuleId::Leakage, severity, message))
}

fn external_anomaly(reading: &Reading) -> Option<Outcome> {
    let anomaly = reading.external_anomaly.as_ref().filter(|a| a.detected)?;
    Some(Outcome::new(
        RuleId::ExternalAnomaly,
        Severity::Critical,
        format!("AI Anomaly: {}", anomaly.details),
    ))
}
