//! External anomaly check backed by an LLM.
//!
//! The detector asks a model whether the current reading shows an unusual
//! pattern and always resolves to a clean [`ExternalAnomaly`] (or `None`
//! when disabled). Transport and parsing failures never escape.
//!
//! [`ExternalAnomaly`]: carwatch_core::ExternalAnomaly

pub mod detector;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use detector::{create_detector, AnomalyDetector, DisabledDetector, LlmAnomalyDetector};
pub use provider::{LlmError, LlmProvider};
