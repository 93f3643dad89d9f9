//! Randomized telemetry generator.
//!
//! Mostly produces healthy values, with per-tick chances of rough gear
//! changes, loud acceleration, low fluids, leaks and diagnostic codes.
//! Seeded simulators are fully deterministic.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::trace;

use carwatch_core::{ErrorCodeHistory, Reading};

use crate::source::TelemetrySource;

/// Codes the simulator draws from. `P0301` appears twice so it comes up
/// more often than the others.
pub const SIMULATED_CODES: [&str; 10] = [
    "P0101", "P0420", "P0301", "P0000", "P0301", "P0700", "P0701", "P0702", "P0703", "U0100",
];

/// Fluid levels at or below this are drawn as "low".
const LOW_FLUID_MAX: u8 = 3;

/// Fault probabilities and value ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorProfile {
    pub engine_temp_c: (i32, i32),
    /// Chance of appending a code to the history; otherwise it is cleared.
    pub error_code_chance: f64,
    pub rough_gear_chance: f64,
    pub loud_sound_chance: f64,
    /// Drawn independently for each of the three fluids.
    pub low_fluid_chance: f64,
    pub leak_chance: f64,
}

impl Default for SimulatorProfile {
    fn default() -> Self {
        Self {
            engine_temp_c: (85, 115),
            error_code_chance: 0.15,
            rough_gear_chance: 0.2,
            loud_sound_chance: 0.18,
            low_fluid_chance: 0.1,
            leak_chance: 0.05,
        }
    }
}

pub struct Simulator<R = StdRng> {
    rng: R,
    profile: SimulatorProfile,
    history: ErrorCodeHistory,
}

impl Simulator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            profile: SimulatorProfile::default(),
            history: ErrorCodeHistory::new(),
        }
    }

    pub fn with_profile(mut self, profile: SimulatorProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Generate the next reading. Never exhausts.
    pub fn sample(&mut self) -> Reading {
        let p = &self.profile;

        let engine_temp_c = self.rng.gen_range(p.engine_temp_c.0..=p.engine_temp_c.1);

        if self.rng.gen_bool(p.error_code_chance) {
            if let Some(code) = SIMULATED_CODES.choose(&mut self.rng) {
                self.history.push(*code);
            }
        } else {
            self.history.clear();
        }

        let gear_smoothness = if self.rng.gen_bool(p.rough_gear_chance) {
            self.rng.gen_range(6..=10)
        } else {
            self.rng.gen_range(1..=5)
        };

        let accel_sound_db = if self.rng.gen_bool(p.loud_sound_chance) {
            self.rng.gen_range(80..=95)
        } else {
            self.rng.gen_range(55..=75)
        };

        let low_fluid_chance = p.low_fluid_chance;
        let transmission_oil = self.fluid_level(low_fluid_chance);
        let engine_oil = self.fluid_level(low_fluid_chance);
        let coolant = self.fluid_level(low_fluid_chance);

        let leak_detected = self.rng.gen_bool(self.profile.leak_chance);

        let reading = Reading {
            engine_temp_c,
            error_codes: self.history.to_vec(),
            gear_smoothness,
            accel_sound_db,
            transmission_oil,
            engine_oil,
            coolant,
            leak_detected,
            external_anomaly: None,
        };
        trace!(?reading, "simulated reading");
        reading
    }

    fn fluid_level(&mut self, low_chance: f64) -> u8 {
        if self.rng.gen_bool(low_chance) {
            self.rng.gen_range(1..=LOW_FLUID_MAX)
        } else {
            self.rng.gen_range(LOW_FLUID_MAX + 1..=10)
        }
    }
}

impl<R: Rng> TelemetrySource for Simulator<R> {
    fn next_reading(&mut self) -> Option<Reading> {
        Some(self.sample())
    }
}
