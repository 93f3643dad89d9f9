//! Anomaly detector collaborators.
//!
//! Every detector resolves to either `None` (no result this tick) or a
//! clean [`ExternalAnomaly`]. Failures are folded into a non-anomalous
//! result whose details describe what went wrong.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use carwatch_core::config::AnomalyConfig;
use carwatch_core::{ExternalAnomaly, Reading};

use crate::prompt::build_prompt;
use crate::provider::{LlmError, LlmProvider};
use crate::providers::create_provider;

#[async_trait]
pub trait AnomalyDetector: Send + Sync {
    /// Check one reading. `None` means no result is available.
    async fn check(&self, reading: &Reading) -> Option<ExternalAnomaly>;
}

/// Detector used when the external check is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDetector;

#[async_trait]
impl AnomalyDetector for DisabledDetector {
    async fn check(&self, _reading: &Reading) -> Option<ExternalAnomaly> {
        None
    }
}

/// JSON object the model is instructed to answer with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnomalyReport {
    anomaly_detected: bool,
    details: String,
}

/// Asks an [`LlmProvider`] about each reading.
pub struct LlmAnomalyDetector {
    provider: Box<dyn LlmProvider>,
}

impl LlmAnomalyDetector {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl AnomalyDetector for LlmAnomalyDetector {
    async fn check(&self, reading: &Reading) -> Option<ExternalAnomaly> {
        let prompt = build_prompt(reading);
        let anomaly = match self.provider.complete(&prompt).await {
            Ok(text) => parse_report(&text),
            Err(e) => failure(e),
        };
        debug!(detected = anomaly.detected, details = %anomaly.details, "anomaly check resolved");
        Some(anomaly)
    }
}

/// Interpret the model's candidate text.
pub fn parse_report(text: &str) -> ExternalAnomaly {
    if text.is_empty() {
        warn!("anomaly model returned empty candidate text");
        return ExternalAnomaly::clear("AI candidate returned empty text.");
    }

    match serde_json::from_str::<AnomalyReport>(text) {
        Ok(report) => ExternalAnomaly {
            detected: report.anomaly_detected,
            details: report.details,
        },
        Err(e) => {
            warn!(error = %e, "anomaly model candidate is not the expected JSON");
            ExternalAnomaly::clear("AI candidate response format error.")
        }
    }
}

/// Map a provider error to a non-anomalous result.
fn failure(error: LlmError) -> ExternalAnomaly {
    warn!(error = %error, "anomaly check failed");
    let details = match error {
        LlmError::EmptyBody => "AI returned empty response body.".to_string(),
        LlmError::MalformedBody(_) => "AI response malformed or incomplete.".to_string(),
        LlmError::NoCandidates => "AI response structure unexpected or no candidates.".to_string(),
        other => format!("AI analysis failed: {}", other),
    };
    ExternalAnomaly::clear(details)
}

/// Build the detector named by the anomaly config.
pub fn create_detector(config: &AnomalyConfig) -> Result<Box<dyn AnomalyDetector>, LlmError> {
    Ok(match create_provider(config)? {
        Some(provider) => Box::new(LlmAnomalyDetector::new(provider)),
        None => Box::new(DisabledDetector),
    })
}
