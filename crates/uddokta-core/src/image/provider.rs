//! Image provider trait and result types.

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use std::fmt;

/// A base64 data URI (`data:<mime>;base64,<payload>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    /// Encode raw image bytes with the given content type.
    pub fn from_bytes(content_type: &str, bytes: &[u8]) -> Self {
        Self(format!(
            "data:{content_type};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    /// Wrap an already base64-encoded PNG payload.
    pub fn from_base64_png(payload: &str) -> Self {
        Self(format!("data:image/png;base64,{payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// MIME type declared in the URI header.
    pub fn media_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or_default()
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = self.0.split_once(',').map(|(_, p)| p).unwrap_or_default();
        base64::engine::general_purpose::STANDARD.decode(payload.trim())
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a single model did not yield an image.
///
/// Serialised in the shape the dashboard front end already reads
/// (`status`, `contentType`, `error`, `text`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ImageFailure {
    /// A failure described only by an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(model) = &self.model {
            write!(f, "{model}: ")?;
        }
        match (&self.error, self.status) {
            (Some(error), Some(status)) => write!(f, "{error} (HTTP {status})"),
            (Some(error), None) => f.write_str(error),
            (None, Some(status)) => write!(f, "HTTP {status} without image"),
            (None, None) => f.write_str("no image in response"),
        }
    }
}

/// No model produced an image. Carries the last model's failure.
///
/// Serialises as `{"error": "no_image", "details": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageError {
    error: &'static str,
    pub details: Option<ImageFailure>,
}

impl ImageError {
    pub fn no_image(details: Option<ImageFailure>) -> Self {
        Self {
            error: "no_image",
            details,
        }
    }

    /// Short error code (`no_image`).
    pub fn code(&self) -> &str {
        self.error
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "no image generated; last failure: {details}"),
            None => f.write_str("no image generated"),
        }
    }
}

impl std::error::Error for ImageError {}

/// Trait that all image providers implement.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Models in the order they are tried.
    fn models(&self) -> Vec<String>;

    /// Render a prompt, returning the first image any model produces.
    async fn generate(&self, prompt: &str) -> Result<DataUri, ImageError>;
}
