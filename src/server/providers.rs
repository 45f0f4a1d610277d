//! LLM provider resolution

use super::config::LlmConfig;
use anyhow::{Context, Result};
use plantworks_llm::{LlmProvider, OpenAiCompatConfig, OpenAiCompatProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the chat-completions provider from configuration
pub fn resolve_llm_provider(llm_config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let Some(api_key) = llm_config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        return Err(anyhow::anyhow!(
            "No LLM API key configured.\n\n\
             Set one of these environment variables:\n\
               GEMINI_API_KEY\n\
               GOOGLE_API_KEY\n\
               PLANTWORKS_LLM__API_KEY\n\n\
             Or add `api_key` under [llm] in config/local.toml."
        ));
    };

    let config = OpenAiCompatConfig::new(api_key)
        .with_base_url(&llm_config.base_url)
        .with_model(&llm_config.model)
        .with_timeout(Duration::from_secs(llm_config.timeout_secs));
    let provider =
        OpenAiCompatProvider::new(config).context("Failed to create LLM provider")?;

    info!(
        base_url = %llm_config.base_url,
        model = %llm_config.model,
        "Registered OpenAI-compatible provider"
    );
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_an_error() {
        let err = resolve_llm_provider(&LlmConfig::default()).err().unwrap();
        assert!(err.to_string().contains("No LLM API key"));

        let blank = LlmConfig {
            api_key: Some("  ".to_string()),
            ..LlmConfig::default()
        };
        assert!(resolve_llm_provider(&blank).is_err());
    }

    #[test]
    fn test_provider_uses_configured_model() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            model: "gemini-2.0-pro".to_string(),
            ..LlmConfig::default()
        };
        let provider = resolve_llm_provider(&config).unwrap();
        assert_eq!(provider.default_model(), "gemini-2.0-pro");
    }
}
