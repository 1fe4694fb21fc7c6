//! Ordered fallback across text providers.
//!
//! Each provider is tried in turn (with optional retries for transient
//! failures). The first response wins and is parsed into a poster concept.
//! When every provider fails the caller gets the full list of failures.

use super::parse::parse_poster_concept;
use super::provider::{LlmProvider, LlmProviderFactory, LlmRequest};
use super::retry;
use crate::config::Config;
use crate::error::ProviderError;
use crate::types::PosterConcept;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Retry settings applied to each provider in the chain.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    /// Extra attempts after the first call
    pub attempts: u32,
    /// Base backoff delay in milliseconds
    pub delay_ms: u64,
}

/// One failed provider in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

/// Every provider in the chain failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainError {
    /// Failures in the order the providers were tried
    pub failures: Vec<ProviderFailure>,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all text providers failed")?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", failure.provider, failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ChainError {}

/// Successful chain output.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub concept: PosterConcept,
    /// Provider that produced the concept
    pub provider: String,
    /// Model reported by that provider
    pub model: String,
}

/// A provider slot. Slots whose provider could not be built (missing key)
/// still occupy their position so the failure is reported in order.
struct Link {
    name: String,
    provider: Result<Arc<dyn LlmProvider>, ProviderError>,
}

/// Text generation fallback chain.
pub struct TextChain {
    links: Vec<Link>,
    retry: RetryPolicy,
}

impl TextChain {
    /// Build a chain from ready providers, tried in the given order.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, retry: RetryPolicy) -> Self {
        let links = providers
            .into_iter()
            .map(|p| Link {
                name: p.name().to_string(),
                provider: Ok(p),
            })
            .collect();
        Self { links, retry }
    }

    /// Build the chain described by `llm.order`.
    ///
    /// Providers without credentials are kept as failing slots and logged.
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_millis(config.limits.llm_timeout_ms);
        let links = config
            .llm
            .order
            .iter()
            .map(|name| {
                let provider = LlmProviderFactory::create(name, &config.llm, timeout)
                    .map(Arc::<dyn LlmProvider>::from);
                if let Err(e) = &provider {
                    tracing::warn!(provider = %name, "{e}");
                }
                Link {
                    name: name.clone(),
                    provider,
                }
            })
            .collect();

        Self {
            links,
            retry: RetryPolicy {
                attempts: config.retry.attempts,
                delay_ms: config.retry.delay_ms,
            },
        }
    }

    /// Provider names in call order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }

    /// Generate a poster concept, falling back through the providers.
    pub async fn generate(&self, text: &str, stats: &Value) -> Result<ChainOutput, ChainError> {
        let request = LlmRequest::poster_concept(text, stats);
        let mut failures = Vec::new();

        for (index, link) in self.links.iter().enumerate() {
            let result = match &link.provider {
                Ok(provider) => self.call_with_retry(provider.as_ref(), &request).await,
                Err(e) => Err(e.clone()),
            };

            match result {
                Ok(response) => {
                    let concept = parse_poster_concept(&response.text);
                    tracing::info!(
                        provider = %link.name,
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        "Poster prompt: {}",
                        concept.poster_prompt
                    );
                    return Ok(ChainOutput {
                        concept,
                        provider: link.name.clone(),
                        model: response.model,
                    });
                }
                Err(e) => {
                    match self.links.get(index + 1) {
                        Some(next) => tracing::warn!(
                            provider = %link.name,
                            "{} failed, trying {} as fallback: {e}",
                            link.name,
                            next.name
                        ),
                        None => tracing::error!(provider = %link.name, "{} failed: {e}", link.name),
                    }
                    failures.push(ProviderFailure {
                        provider: link.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(ChainError { failures })
    }

    async fn call_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: &LlmRequest,
    ) -> Result<super::LlmResponse, ProviderError> {
        let timeout = provider.timeout();
        let mut last_error = None;

        for attempt in 0..=self.retry.attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.retry.delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} for {} after {delay:?}",
                    self.retry.attempts,
                    provider.name()
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(timeout, provider.generate(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    let retryable = retry::is_retryable(&e);
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    // Timeouts are retryable
                    last_error = Some(ProviderError::Timeout {
                        provider: provider.name().to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Llm {
            message: format!("{} made no attempts", provider.name()),
            status_code: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A configurable mock provider.
    ///
    /// Each call to `generate()` invokes the response factory with the current
    /// call index, allowing different results per attempt.
    struct MockProvider {
        name: &'static str,
        response_fn: Box<dyn Fn(u32) -> Result<LlmResponse, ProviderError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
        delay: Option<Duration>,
    }

    impl MockProvider {
        fn new(
            name: &'static str,
            f: impl Fn(u32) -> Result<LlmResponse, ProviderError> + Send + Sync + 'static,
        ) -> (Arc<dyn LlmProvider>, Arc<AtomicU32>) {
            let call_count = Arc::new(AtomicU32::new(0));
            let provider = Self {
                name,
                response_fn: Box::new(f),
                call_count: call_count.clone(),
                delay: None,
            };
            (Arc::new(provider), call_count)
        }

        fn slow(name: &'static str, delay: Duration) -> Arc<dyn LlmProvider> {
            Arc::new(Self {
                name,
                response_fn: Box::new(|_| Ok(ok_response("{}"))),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            let n = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.response_fn)(n)
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    fn ok_response(text: &str) -> LlmResponse {
        LlmResponse {
            text: text.to_string(),
            model: "mock-model".to_string(),
            tokens_used: None,
            latency_ms: 1,
        }
    }

    fn http_error(code: u16) -> ProviderError {
        ProviderError::Llm {
            message: format!("HTTP {code}"),
            status_code: Some(code),
        }
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let (openai, openai_calls) = MockProvider::new("openai", |_| {
            Ok(ok_response(r#"{"poster_prompt":"p1","caption":"c1"}"#))
        });
        let (gemini, gemini_calls) = MockProvider::new("gemini", |_| Ok(ok_response("{}")));

        let chain = TextChain::new(vec![openai, gemini], RetryPolicy::default());
        let out = chain.generate("idea", &json!({})).await.unwrap();

        assert_eq!(out.concept, PosterConcept::new("p1", "c1"));
        assert_eq!(out.provider, "openai");
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_second_provider() {
        let (openai, _) = MockProvider::new("openai", |_| Err(http_error(401)));
        let (gemini, gemini_calls) = MockProvider::new("gemini", |_| {
            Ok(ok_response(r#"{"poster_prompt":"from gemini"}"#))
        });

        let chain = TextChain::new(vec![openai, gemini], RetryPolicy::default());
        let out = chain.generate("idea", &json!({})).await.unwrap();

        assert_eq!(out.provider, "gemini");
        assert_eq!(out.concept.poster_prompt, "from gemini");
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_fail_reports_every_provider_in_order() {
        let (openai, _) = MockProvider::new("openai", |_| Err(http_error(500)));
        let (gemini, _) = MockProvider::new("gemini", |_| Err(http_error(403)));

        let chain = TextChain::new(vec![openai, gemini], RetryPolicy::default());
        let err = chain.generate("idea", &json!({})).await.unwrap_err();

        let names: Vec<_> = err.failures.iter().map(|f| f.provider.as_str()).collect();
        assert_eq!(names, vec!["openai", "gemini"]);
        assert_eq!(err.failures[1].message, "HTTP 403");
        assert_eq!(
            err.to_string(),
            "all text providers failed: openai: HTTP 500; gemini: HTTP 403"
        );
    }

    #[tokio::test]
    async fn test_retries_transient_error_then_succeeds() {
        let (openai, calls) = MockProvider::new("openai", |n| {
            if n == 0 {
                Err(http_error(503))
            } else {
                Ok(ok_response(r#"{"poster_prompt":"second try"}"#))
            }
        });

        let policy = RetryPolicy {
            attempts: 2,
            delay_ms: 1,
        };
        let chain = TextChain::new(vec![openai], policy);
        let out = chain.generate("idea", &json!({})).await.unwrap();

        assert_eq!(out.concept.poster_prompt, "second try");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_skips_retries() {
        let (openai, calls) = MockProvider::new("openai", |_| Err(http_error(400)));

        let policy = RetryPolicy {
            attempts: 3,
            delay_ms: 1,
        };
        let chain = TextChain::new(vec![openai], policy);
        assert!(chain.generate("idea", &json!({})).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_provider() {
        let slow = MockProvider::slow("openai", Duration::from_secs(5));
        let (gemini, _) = MockProvider::new("gemini", |_| {
            Ok(ok_response(r#"{"poster_prompt":"fast"}"#))
        });

        let chain = TextChain::new(vec![slow, gemini], RetryPolicy::default());
        let out = chain.generate("idea", &json!({})).await.unwrap();
        assert_eq!(out.provider, "gemini");
    }

    #[tokio::test]
    async fn test_unconfigured_providers_fail_in_order() {
        let mut config = Config::default();
        config.llm.openai.as_mut().unwrap().api_key = "${UDDOKTA_TEST_NO_OPENAI}".into();
        config.llm.gemini.as_mut().unwrap().api_key = "${UDDOKTA_TEST_NO_GEMINI}".into();

        let chain = TextChain::from_config(&config);
        assert_eq!(chain.provider_names(), vec!["openai", "gemini"]);

        let err = chain.generate("idea", &json!({})).await.unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert!(err.failures[0].message.contains("OPENAI_API_KEY"));
        assert!(err.failures[1].message.contains("GEMINI_API_KEY"));
    }
}
