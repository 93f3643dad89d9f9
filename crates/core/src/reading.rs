use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of diagnostic codes a reading carries.
pub const ERROR_CODE_CAPACITY: usize = 5;

/// Resolved verdict of the external anomaly check for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAnomaly {
    pub detected: bool,
    pub details: String,
}

impl ExternalAnomaly {
    pub fn detected(details: impl Into<String>) -> Self {
        Self {
            detected: true,
            details: details.into(),
        }
    }

    pub fn clear(details: impl Into<String>) -> Self {
        Self {
            detected: false,
            details: details.into(),
        }
    }
}

/// Snapshot of every tracked telemetry value for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Engine temperature in °C.
    pub engine_temp_c: i32,
    /// Active diagnostic codes, most recent last.
    #[serde(default)]
    pub error_codes: Vec<String>,
    /// 1 = smooth, 10 = roughest.
    pub gear_smoothness: u8,
    /// Acceleration noise level in dB.
    pub accel_sound_db: i32,
    /// Fluid levels, 10 = full.
    pub transmission_oil: u8,
    pub engine_oil: u8,
    pub coolant: u8,
    #[serde(default)]
    pub leak_detected: bool,
    /// `None` while the external check has not produced a result.
    #[serde(default)]
    pub external_anomaly: Option<ExternalAnomaly>,
}

impl Reading {
    /// A reading in which no rule triggers.
    pub fn nominal() -> Self {
        Self {
            engine_temp_c: 90,
            error_codes: Vec::new(),
            gear_smoothness: 5,
            accel_sound_db: 60,
            transmission_oil: 9,
            engine_oil: 9,
            coolant: 9,
            leak_detected: false,
            external_anomaly: None,
        }
    }

    pub fn with_engine_temp(mut self, celsius: i32) -> Self {
        self.engine_temp_c = celsius;
        self
    }

    pub fn with_error_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gear_smoothness(mut self, smoothness: u8) -> Self {
        self.gear_smoothness = smoothness;
        self
    }

    pub fn with_accel_sound(mut self, db: i32) -> Self {
        self.accel_sound_db = db;
        self
    }

    pub fn with_transmission_oil(mut self, level: u8) -> Self {
        self.transmission_oil = level;
        self
    }

    pub fn with_engine_oil(mut self, level: u8) -> Self {
        self.engine_oil = level;
        self
    }

    pub fn with_coolant(mut self, level: u8) -> Self {
        self.coolant = level;
        self
    }

    pub fn with_leak(mut self, leak: bool) -> Self {
        self.leak_detected = leak;
        self
    }

    pub fn with_external_anomaly(mut self, anomaly: Option<ExternalAnomaly>) -> Self {
        self.external_anomaly = anomaly;
        self
    }

    /// Drop the oldest codes until at most [`ERROR_CODE_CAPACITY`] remain.
    pub fn trim_error_codes(&mut self) {
        let len = self.error_codes.len();
        if len > ERROR_CODE_CAPACITY {
            self.error_codes.drain(..len - ERROR_CODE_CAPACITY);
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::nominal()
    }
}

/// Bounded, ordered history of diagnostic codes kept by telemetry sources.
///
/// Pushing past [`ERROR_CODE_CAPACITY`] drops the oldest code.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeHistory {
    codes: VecDeque<String>,
}

impl ErrorCodeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: impl Into<String>) {
        self.codes.push_back(code.into());
        while self.codes.len() > ERROR_CODE_CAPACITY {
            self.codes.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.codes.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_drops_oldest_past_capacity() {
        let mut history = ErrorCodeHistory::new();
        for code in ["P0001", "P0002", "P0003", "P0004", "P0005", "P0006", "P0007"] {
            history.push(code);
        }

        assert_eq!(history.len(), ERROR_CODE_CAPACITY);
        assert_eq!(
            history.to_vec(),
            vec!["P0003", "P0004", "P0005", "P0006", "P0007"]
        );

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn trim_keeps_most_recent_codes() {
        let mut reading = Reading::nominal()
            .with_error_codes(["A", "B", "C", "D", "E", "F", "G"]);
        reading.trim_error_codes();
        assert_eq!(reading.error_codes, vec!["C", "D", "E", "F", "G"]);
    }

    #[test]
    fn reading_deserializes_with_optional_fields_missing() {
        let reading: Reading = serde_json::from_str(
            r#"{
                "engine_temp_c": 101,
                "gear_smoothness": 3,
                "accel_sound_db": 70,
                "transmission_oil": 8,
                "engine_oil": 7,
                "coolant": 6
            }"#,
        )
        .unwrap();

        assert_eq!(reading.engine_temp_c, 101);
        assert!(reading.error_codes.is_empty());
        assert!(!reading.leak_detected);
        assert!(reading.external_anomaly.is_none());
    }
}
