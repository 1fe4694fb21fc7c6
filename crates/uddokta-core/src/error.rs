//! Error types for the Uddokta generation chain.
//!
//! Provider errors carry the HTTP status when one was observed so that the
//! retry logic can classify them without string matching.

use thiserror::Error;

/// Top-level error type for Uddokta operations.
#[derive(Error, Debug)]
pub enum UddoktaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider call errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by a single call to an external AI provider.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Text generation failed
    #[error("{message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// Image generation failed
    #[error("{message}")]
    Image {
        message: String,
        status_code: Option<u16>,
    },

    /// Provider has no credentials configured
    #[error("{0}")]
    NotConfigured(String),

    /// Operation timed out
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },
}

impl ProviderError {
    /// HTTP status code reported by the provider, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Llm { status_code, .. } | Self::Image { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Convenience type alias for Uddokta results.
pub type Result<T> = std::result::Result<T, UddoktaError>;
