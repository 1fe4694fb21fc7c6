//! Poster orchestration: text chain, then image chain.
//!
//! An image failure does not fail the request. The caller still gets the
//! caption and prompt, with `image: null` and the image error attached.

use crate::config::{Config, LimitsConfig};
use crate::image::{HuggingFaceProvider, ImageError, ImageFailure, ImageProvider};
use crate::llm::{ChainError, TextChain};
use crate::types::{PosterConcept, PosterRequest};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result of a poster request that got far enough to produce a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PosterResponse {
    pub caption: String,
    pub poster_prompt: String,
    /// Data URI of the rendered poster, `null` when no model produced one
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hf_error: Option<ImageError>,
}

/// Reasons a poster request fails outright.
#[derive(Error, Debug)]
pub enum PosterError {
    /// `text` missing or empty
    #[error("Missing 'text' in request body")]
    MissingText,

    /// Every text provider failed
    #[error("{0}")]
    TextGeneration(#[from] ChainError),

    /// A provider answered but no poster prompt could be extracted
    #[error("Failed to generate prompt")]
    EmptyPrompt { concept: PosterConcept },
}

/// Runs the text chain and image provider for each request.
pub struct PosterService {
    text: TextChain,
    image: Arc<dyn ImageProvider>,
    image_deadline: Duration,
}

impl PosterService {
    pub fn new(text: TextChain, image: Arc<dyn ImageProvider>) -> Self {
        Self {
            text,
            image,
            image_deadline: Duration::from_millis(LimitsConfig::default().image_deadline_ms),
        }
    }

    /// Cap the total time spent across all image models.
    pub fn with_image_deadline(mut self, deadline: Duration) -> Self {
        self.image_deadline = deadline;
        self
    }

    /// Build the configured chain: text providers from `llm.order`, then
    /// Hugging Face for images.
    pub fn from_config(config: &Config) -> Self {
        let image = HuggingFaceProvider::new(
            &config.image.huggingface,
            Duration::from_millis(config.limits.image_timeout_ms),
        );
        tracing::info!(
            "Using primary Hugging Face model: {}",
            config.image.huggingface.model
        );
        if !config.image.huggingface.provider.is_empty() {
            tracing::info!("Using HF provider: {}", config.image.huggingface.provider);
        }
        if !config.image.huggingface.fallbacks.is_empty() {
            tracing::info!(
                "HF fallback models: {}",
                config.image.huggingface.fallbacks.join(", ")
            );
        }
        Self::new(TextChain::from_config(config), Arc::new(image))
            .with_image_deadline(Duration::from_millis(config.limits.image_deadline_ms))
    }

    pub fn text_chain(&self) -> &TextChain {
        &self.text
    }

    pub fn image_provider(&self) -> &dyn ImageProvider {
        self.image.as_ref()
    }

    /// Produce a caption, poster prompt and (when possible) an image.
    pub async fn create(&self, request: PosterRequest) -> Result<PosterResponse, PosterError> {
        let text = request
            .text
            .filter(|t| !t.is_empty())
            .ok_or(PosterError::MissingText)?;
        let stats = effective_stats(request.stats);

        let output = self.text.generate(&text, &stats).await?;
        let concept = output.concept;
        if concept.poster_prompt.is_empty() {
            return Err(PosterError::EmptyPrompt { concept });
        }

        let generated =
            tokio::time::timeout(self.image_deadline, self.image.generate(&concept.poster_prompt))
                .await
                .unwrap_or_else(|_| {
                    Err(ImageError::no_image(Some(ImageFailure::error(format!(
                        "image generation timed out after {}ms",
                        self.image_deadline.as_millis()
                    )))))
                });

        let (image, hf_error) = match generated {
            Ok(uri) => (Some(uri.into_string()), None),
            Err(e) => {
                tracing::warn!(provider = self.image.name(), "{e}");
                (None, Some(e))
            }
        };

        Ok(PosterResponse {
            caption: concept.caption,
            poster_prompt: concept.poster_prompt,
            image,
            hf_error,
        })
    }
}

/// Stats are passed through as given. Missing, null, `false`, `0` and `""`
/// count as no stats and become `{}`.
fn effective_stats(stats: Option<Value>) -> Value {
    match stats {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Value::Object(Map::new()),
        Some(Value::String(s)) if s.is_empty() => Value::Object(Map::new()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Value::Object(Map::new()),
        Some(other) => other,
    }
}
