//! Stateful evaluation engine.
//!
//! [`Engine`] owns the rule counters and thresholds. Each call to
//! [`Engine::evaluate`] consumes one reading, runs every rule in order,
//! and folds the outcomes into a [`Verdict`]. It performs no I/O and
//! never fails.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use carwatch_core::{Reading, Verdict};

use crate::aggregate::aggregate;
use crate::rule::{evaluate_rule, Outcome, RuleId, RuleState};
use crate::thresholds::RuleThresholds;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    state: RuleState,
    thresholds: RuleThresholds,
}

impl Engine {
    /// Engine with the built-in thresholds and all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RuleThresholds) -> Self {
        Self {
            state: RuleState::new(),
            thresholds,
        }
    }

    /// Evaluate one tick.
    pub fn evaluate(&mut self, reading: &Reading) -> Verdict {
        let outcomes = self.outcomes(reading);
        let verdict = aggregate(outcomes);
        trace!(status = %verdict.status, messages = verdict.messages.len(), "tick evaluated");
        verdict
    }

    /// Run every rule for one tick without aggregating.
    ///
    /// Counters advance exactly as they do in [`evaluate`](Self::evaluate).
    pub fn outcomes(&mut self, reading: &Reading) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for rule in RuleId::ALL {
            if let Some(outcome) = evaluate_rule(rule, reading, &mut self.state, &self.thresholds)
            {
                debug!(
                    rule = %outcome.rule,
                    severity = %outcome.severity,
                    count = ?self.state.count(rule),
                    "rule fired"
                );
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    pub fn state(&self) -> &RuleState {
        &self.state
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Zero every counter. Thresholds are kept.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

// ── Shared engine ───────────────────────────────────────────────────

/// Cloneable handle for multi-threaded hosts.
///
/// The lock is held for the whole of one evaluation so that counter
/// updates from concurrent ticks never interleave. A poisoned lock is
/// recovered: the counters are plain integers and stay consistent.
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn evaluate(&self, reading: &Reading) -> Verdict {
        let mut engine = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        engine.evaluate(reading)
    }

    /// Copy of the current counters.
    pub fn state(&self) -> RuleState {
        let engine = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        engine.state().clone()
    }

    pub fn reset(&self) {
        let mut engine = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        engine.reset();
    }
}
