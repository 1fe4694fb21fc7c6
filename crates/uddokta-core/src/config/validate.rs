//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::llm::{retry, KNOWN_PROVIDERS};

use super::Config;

/// Largest accepted request body.
pub const MAX_BODY_LIMIT_MB: usize = 1024;

impl Config {
    /// Worst-case time spent in the text chain: every provider times out on
    /// every attempt, with the backoff sleeps in between.
    pub fn text_budget_ms(&self) -> u64 {
        let backoff: u64 = (0..self.retry.attempts)
            .map(|a| retry::backoff_duration(a, self.retry.delay_ms).as_millis() as u64)
            .fold(0, u64::saturating_add);
        let per_provider = self
            .limits
            .llm_timeout_ms
            .saturating_mul(u64::from(self.retry.attempts) + 1)
            .saturating_add(backoff);
        per_provider.saturating_mul(self.llm.order.len() as u64)
    }

    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if self.server.body_limit_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_mb must be > 0".into(),
            ));
        }
        if self.server.body_limit_mb > MAX_BODY_LIMIT_MB {
            return Err(ConfigError::ValidationError(format!(
                "server.body_limit_mb must be <= {MAX_BODY_LIMIT_MB}"
            )));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.request_timeout_secs must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.image_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.image_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.image_deadline_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.image_deadline_ms must be > 0".into(),
            ));
        }
        if self.llm.order.is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.order must name at least one provider".into(),
            ));
        }
        if let Some(unknown) = self
            .llm
            .order
            .iter()
            .find(|name| !KNOWN_PROVIDERS.contains(&name.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "llm.order contains unknown provider '{unknown}' (expected one of: {})",
                KNOWN_PROVIDERS.join(", ")
            )));
        }
        if self.image.huggingface.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "image.huggingface.model must not be empty".into(),
            ));
        }

        let request_ms = self.server.request_timeout_secs.saturating_mul(1000);
        let needed_ms = self
            .text_budget_ms()
            .saturating_add(self.limits.image_deadline_ms);
        if needed_ms >= request_ms {
            return Err(ConfigError::ValidationError(format!(
                "server.request_timeout_secs ({}s) must exceed the text budget ({}ms) \
                 plus limits.image_deadline_ms ({}ms)",
                self.server.request_timeout_secs,
                self.text_budget_ms(),
                self.limits.image_deadline_ms
            )));
        }
        Ok(())
    }
}
