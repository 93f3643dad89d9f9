//! Debounced vehicle-health rule engine.
//!
//! This crate provides:
//! - A hysteresis counter that turns per-tick conditions into sustained counts
//! - The fixed rule set (temperature, error codes, gears, sound, fluids, leaks,
//!   external anomaly) with YAML-overridable thresholds
//! - Precedence aggregation of rule outcomes into a single [`Verdict`]
//! - [`Engine`] and its thread-safe wrapper [`SharedEngine`]
//!
//! [`Verdict`]: carwatch_core::Verdict

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod hysteresis;
pub mod rule;
pub mod thresholds;

pub use aggregate::aggregate;
pub use engine::{Engine, SharedEngine};
pub use error::{Result, RuleError};
pub use hysteresis::HysteresisCounter;
pub use rule::{Outcome, RuleId, RuleState};
pub use thresholds::RuleThresholds;
