pub mod gemini;

use carwatch_core::config::AnomalyConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the LLM provider named by the anomaly config.
///
/// Returns `Ok(None)` when the check is disabled (`provider = "none"`).
pub fn create_provider(config: &AnomalyConfig) -> Result<Option<Box<dyn LlmProvider>>, LlmError> {
    match config.provider.as_str() {
        "none" => Ok(None),
        "gemini" => {
            let api_key = config
                .gemini_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
            Ok(Some(Box::new(gemini::GeminiProvider::new(
                api_key.clone(),
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
            ))))
        }
        other => Err(LlmError::NotConfigured(format!(
            "unknown anomaly provider: '{}'",
            other
        ))),
    }
}
