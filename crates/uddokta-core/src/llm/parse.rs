//! Extraction of a poster concept from free-form model output.
//!
//! Models are asked for bare JSON but routinely wrap it in prose or code
//! fences, so the outermost `{ ... }` span is parsed instead of the whole text.

use crate::types::PosterConcept;
use serde_json::Value;

/// Parse a `PosterConcept` out of model output.
///
/// Takes the span from the first `{` to the last `}` (or the whole content
/// when there is no such span) and parses it as JSON. If that fails, the
/// trimmed content is used verbatim as the poster prompt with no caption.
pub fn parse_poster_concept(content: &str) -> PosterConcept {
    let candidate = json_span(content).unwrap_or(content);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => PosterConcept {
            poster_prompt: first_text(&value, &["poster_prompt", "prompt", "prompt_text"]),
            caption: first_text(&value, &["caption", "title"]),
        },
        Err(_) => {
            tracing::warn!(
                "Could not parse structured JSON from model response, using raw text as prompt"
            );
            PosterConcept::new(content.trim(), "")
        }
    }
}

/// Greedy outermost brace span: first `{` through last `}`.
fn json_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// First key holding a non-empty string.
fn first_text(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}
