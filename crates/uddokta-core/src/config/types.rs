//! Sub-configuration structs with defaults matching the hosted deployment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Maximum accepted request body in megabytes
    pub body_limit_mb: usize,

    /// Whole-request timeout in seconds (covers every provider call)
    pub request_timeout_secs: u64,

    /// Optional directory of static files served after the API routes
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit_mb: 5,
            request_timeout_secs: 300,
            static_dir: None,
        }
    }
}

/// Per-call time limits for external providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Text provider call timeout in milliseconds
    pub llm_timeout_ms: u64,

    /// Image provider call timeout in milliseconds (per HTTP request)
    pub image_timeout_ms: u64,

    /// Deadline for the whole image chain (every model and stage) in milliseconds.
    /// Text budget plus this must stay below `server.request_timeout_secs`.
    pub image_deadline_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 60_000,
            image_timeout_ms: 120_000,
            image_deadline_ms: 150_000,
        }
    }
}

/// Retry settings for transient text provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts per provider before moving to the next one.
    /// Zero means every provider is called exactly once.
    pub attempts: u32,

    /// Base backoff delay in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Text provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Providers tried in order until one produces a poster concept
    pub order: Vec<String>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Gemini configuration
    pub gemini: Option<GeminiConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            order: vec!["openai".to_string(), "gemini".to_string()],
            openai: Some(OpenAiConfig::default()),
            gemini: Some(GeminiConfig::default()),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Image provider configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Hugging Face inference settings
    pub huggingface: HuggingFaceConfig,
}

/// Hugging Face image generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    /// API token (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Primary model id
    pub model: String,

    /// Models tried in order after the primary one fails
    pub fallbacks: Vec<String>,

    /// Inference provider routed through the Hugging Face router.
    /// Empty disables the provider route and goes straight to direct inference.
    pub provider: String,

    /// Router base used for provider-routed calls
    pub provider_endpoint: String,

    /// Direct serverless inference base
    pub inference_endpoint: String,

    /// Endpoint retried when direct inference reports the model as moved (HTTP 410)
    pub router_endpoint: String,

    /// Classifier-free guidance scale sent with every request
    pub guidance_scale: f32,

    /// Ask the API to block until a cold model is loaded
    pub wait_for_model: bool,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: "${HF_API_KEY}".to_string(),
            model: "stabilityai/stable-diffusion-3.5-large".to_string(),
            fallbacks: vec!["runwayml/stable-diffusion-v1-5".to_string()],
            provider: "fal-ai".to_string(),
            provider_endpoint: "https://router.huggingface.co".to_string(),
            inference_endpoint: "https://api-inference.huggingface.co".to_string(),
            router_endpoint: "https://router.huggingface.co/hf-inference".to_string(),
            guidance_scale: 7.5,
            wait_for_model: true,
        }
    }
}

impl HuggingFaceConfig {
    /// Primary model followed by the fallbacks, in call order.
    pub fn models(&self) -> Vec<String> {
        std::iter::once(self.model.clone())
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

/// Split a comma-separated model list, trimming entries and dropping empties.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
