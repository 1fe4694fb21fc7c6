//! Core data types flowing through the generation chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A poster concept produced by a text provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterConcept {
    /// Free-text description handed to the image model
    pub poster_prompt: String,

    /// Short marketing caption shown next to the poster
    pub caption: String,
}

impl PosterConcept {
    pub fn new(poster_prompt: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            poster_prompt: poster_prompt.into(),
            caption: caption.into(),
        }
    }
}

/// Inbound request for a poster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosterRequest {
    /// The marketing idea. Required and non-empty.
    #[serde(default)]
    pub text: Option<String>,

    /// Optional free-form business stats forwarded to the text model.
    /// Usually an object, but any JSON value is passed through.
    #[serde(default)]
    pub stats: Option<Value>,
}

impl PosterRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: impl Into<Value>) -> Self {
        self.stats = Some(stats.into());
        self
    }
}
