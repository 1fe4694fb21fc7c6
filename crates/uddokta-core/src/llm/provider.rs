//! LLM provider trait and request/response types.
//!
//! Defines the interface that all text providers implement, plus the
//! factory that creates the right provider from config.

use crate::config::{resolve_env_var, LlmConfig};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Provider names accepted in `llm.order`.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "gemini"];

const POSTER_SYSTEM_PROMPT: &str = "You are a marketing assistant. Respond only in JSON with keys: \
'poster_prompt' and 'caption'. No extra text or markdown.";

/// A request for generated text.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Optional system instruction
    pub system: Option<String>,
    /// User prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Build a poster-concept request from the user's idea and stats.
    ///
    /// The model is asked for a JSON object with `poster_prompt` and `caption`.
    pub fn poster_concept(text: &str, stats: &Value) -> Self {
        let stats_json = stats.to_string();
        Self {
            system: Some(POSTER_SYSTEM_PROMPT.to_string()),
            prompt: format!("Create JSON for this idea:\nText: \"{text}\"\nStats: {stats_json}"),
            max_tokens: 400,
            temperature: 0.7,
        }
    }
}

/// The response from a text generation call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all text providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the chain holds `Arc<dyn LlmProvider>`).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Generate text for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Map a reqwest transport failure to a provider error.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> ProviderError {
    ProviderError::Llm {
        message: format!("{provider} request failed: {e}"),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

/// Factory that creates the appropriate provider from config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a text provider by name.
    ///
    /// # Arguments
    /// * `provider` - Provider identifier ("openai", "gemini")
    /// * `config` - The full LLM config section
    /// * `timeout` - Per-request timeout
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, ProviderError> {
        match provider {
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ProviderError::NotConfigured(
                        "OpenAI API key not set. Set OPENAI_API_KEY env var.".to_string(),
                    )
                })?;
                Ok(Box::new(super::openai::OpenAiProvider::with_endpoint(
                    &api_key,
                    &cfg.model,
                    &cfg.endpoint,
                    timeout,
                )))
            }
            "gemini" => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ProviderError::NotConfigured(
                        "Gemini API key not set. Set GEMINI_API_KEY env var.".to_string(),
                    )
                })?;
                Ok(Box::new(super::gemini::GeminiProvider::with_endpoint(
                    &api_key,
                    &cfg.model,
                    &cfg.endpoint,
                    timeout,
                )))
            }
            other => Err(ProviderError::NotConfigured(format!(
                "Unknown LLM provider: {other}"
            ))),
        }
    }
}
