//! Normalisation of the many response shapes image endpoints return.
//!
//! Depending on model and route, Hugging Face answers with raw image bytes,
//! a JSON array of base64 strings, an object with `images`,
//! `generated_images` or `data` arrays (entries either base64 strings or
//! `{"b64_json": ...}` objects), or a JSON error.

use super::provider::{DataUri, ImageFailure};
use serde_json::Value;

/// Classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// An image was found
    Image(DataUri),
    /// The body is JSON carrying an explicit `error`
    Error(ImageFailure),
    /// Nothing recognisable
    Unrecognized(ImageFailure),
}

const IMAGE_ARRAY_FIELDS: &[&str] = &["images", "generated_images", "data"];

/// Classify an HTTP response into an image or a failure.
pub fn normalize(status: u16, content_type: &str, body: &[u8]) -> Shape {
    let success = (200..300).contains(&status);

    if success && content_type.contains("image") {
        return Shape::Image(DataUri::from_bytes(content_type, body));
    }
    if success && content_type.starts_with("application/octet-stream") {
        return Shape::Image(DataUri::from_bytes(sniff_media_type(body), body));
    }

    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        if let Some(payload) = first_base64(&json) {
            return Shape::Image(DataUri::from_base64_png(payload));
        }
        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Shape::Error(ImageFailure::error(message).with_status(status));
        }
    }

    Shape::Unrecognized(ImageFailure {
        status: Some(status),
        content_type: Some(content_type.to_string()),
        text: Some(String::from_utf8_lossy(body).into_owned()),
        ..ImageFailure::default()
    })
}

/// First base64 payload in any of the known JSON layouts.
fn first_base64(json: &Value) -> Option<&str> {
    if let Some(first) = json.as_array().and_then(|a| a.first()) {
        return first.as_str();
    }
    IMAGE_ARRAY_FIELDS
        .iter()
        .filter_map(|field| json.get(*field)?.as_array()?.first())
        .find_map(|first| {
            first
                .as_str()
                .or_else(|| first.get("b64_json").and_then(Value::as_str))
        })
}

/// Guess a media type from magic bytes, defaulting to PNG.
fn sniff_media_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => "image/png",
    }
}
