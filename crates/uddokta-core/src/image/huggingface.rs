//! Hugging Face text-to-image provider with model fallback.
//!
//! For each model the call goes through:
//! 1. the inference provider route (`<provider_endpoint>/<provider>/models/<model>`),
//!    when a provider is configured; transport errors, HTTP errors and
//!    unrecognised bodies fall through to step 2,
//! 2. direct serverless inference (`<inference_endpoint>/models/<model>`),
//! 3. the `hf-inference` router, only when step 2 answers 410 and points there.

use super::normalize::{normalize, Shape};
use super::provider::{DataUri, ImageError, ImageFailure, ImageProvider};
use crate::config::{resolve_env_var, HuggingFaceConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::time::Duration;

/// Hugging Face provider.
pub struct HuggingFaceProvider {
    api_key: Option<String>,
    config: HuggingFaceConfig,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct InferenceBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    inputs: &'a str,
    options: InferenceOptions,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Serialize)]
struct InferenceParameters {
    guidance_scale: f32,
}

/// Raw pieces of an HTTP response needed for normalisation.
struct RawResponse {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl HuggingFaceProvider {
    /// Create from config. A missing token is not fatal here: every model
    /// call then fails with a "not configured" failure.
    pub fn new(config: &HuggingFaceConfig, timeout: Duration) -> Self {
        let api_key = resolve_env_var(&config.api_key);
        if api_key.is_none() {
            tracing::warn!("HF_API_KEY missing, image generation will fail");
        }
        Self {
            api_key,
            config: config.clone(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn body<'a>(&self, model: Option<&'a str>, prompt: &'a str) -> InferenceBody<'a> {
        InferenceBody {
            model,
            inputs: prompt,
            options: InferenceOptions {
                wait_for_model: self.config.wait_for_model,
            },
            parameters: InferenceParameters {
                guidance_scale: self.config.guidance_scale,
            },
        }
    }

    async fn post(
        &self,
        url: &str,
        api_key: &str,
        body: &InferenceBody<'_>,
    ) -> Result<RawResponse, reqwest::Error> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header(
                "Accept",
                "image/png, image/jpeg, application/json, application/octet-stream",
            )
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    /// Render `prompt` with one specific model.
    pub async fn call_model(&self, model: &str, prompt: &str) -> Result<DataUri, ImageFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ImageFailure::error("HF_API_KEY not configured").with_model(model))?;

        tracing::info!("Calling HF model {model}...");

        if !self.config.provider.is_empty() {
            if let Some(result) = self.provider_route(api_key, model, prompt).await {
                return result;
            }
        }

        let url = format!(
            "{}/models/{model}",
            self.config.inference_endpoint.trim_end_matches('/')
        );
        let raw = self
            .post(&url, api_key, &self.body(None, prompt))
            .await
            .map_err(|e| ImageFailure::error(e.to_string()).with_model(model))?;

        if raw.status == 410 && String::from_utf8_lossy(&raw.body).contains("router.huggingface.co") {
            tracing::warn!(
                "HF API endpoint deprecated for {model}; retrying with {}",
                self.config.router_endpoint
            );
            return self.router_retry(api_key, model, prompt).await;
        }

        match normalize(raw.status, &raw.content_type, &raw.body) {
            Shape::Image(uri) => Ok(uri),
            Shape::Error(failure) | Shape::Unrecognized(failure) => Err(failure.with_model(model)),
        }
    }

    /// Provider-routed call. `None` means "fall through to direct inference".
    async fn provider_route(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Option<Result<DataUri, ImageFailure>> {
        let url = format!(
            "{}/{}/models/{model}",
            self.config.provider_endpoint.trim_end_matches('/'),
            self.config.provider
        );
        tracing::debug!(provider = %self.config.provider, "Calling HF provider route for {model}");

        let raw = match self.post(&url, api_key, &self.body(None, prompt)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("HF provider route failed, falling back to direct inference: {e}");
                return None;
            }
        };

        if !(200..300).contains(&raw.status) {
            tracing::warn!(
                status = raw.status,
                "HF provider route returned an error, falling back to direct inference"
            );
            return None;
        }

        match normalize(raw.status, &raw.content_type, &raw.body) {
            Shape::Image(uri) => Some(Ok(uri)),
            Shape::Error(failure) => Some(Err(failure.with_model(model))),
            Shape::Unrecognized(_) => {
                tracing::warn!(
                    content_type = %raw.content_type,
                    "HF provider route returned unrecognized shape, falling back to direct inference"
                );
                None
            }
        }
    }

    async fn router_retry(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<DataUri, ImageFailure> {
        let raw = self
            .post(&self.config.router_endpoint, api_key, &self.body(Some(model), prompt))
            .await
            .map_err(|e| {
                tracing::error!("Router fallback failed: {e}");
                ImageFailure::error(e.to_string())
                    .with_status(410)
                    .with_model(model)
            })?;

        match normalize(raw.status, &raw.content_type, &raw.body) {
            Shape::Image(uri) => Ok(uri),
            Shape::Error(failure) | Shape::Unrecognized(failure) => Err(failure.with_model(model)),
        }
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn models(&self) -> Vec<String> {
        self.config.models()
    }

    async fn generate(&self, prompt: &str) -> Result<DataUri, ImageError> {
        let mut last_failure = None;

        for model in self.config.models() {
            match self.call_model(&model, prompt).await {
                Ok(uri) => {
                    tracing::info!(model = %model, media_type = uri.media_type(), "Image generated");
                    return Ok(uri);
                }
                Err(failure) => {
                    tracing::warn!("Model {model} did not return image: {failure}");
                    last_failure = Some(failure);
                }
            }
        }

        Err(ImageError::no_image(last_failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, provider: &str) -> HuggingFaceConfig {
        HuggingFaceConfig {
            api_key: "hf_test".into(),
            model: "org/primary".into(),
            fallbacks: vec!["org/backup".into()],
            provider: provider.into(),
            provider_endpoint: format!("{}/route", server.uri()),
            inference_endpoint: server.uri(),
            router_endpoint: format!("{}/hf-inference", server.uri()),
            ..HuggingFaceConfig::default()
        }
    }

    fn provider(config: &HuggingFaceConfig) -> HuggingFaceProvider {
        HuggingFaceProvider::new(config, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_direct_binary_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_json(json!({
                "inputs": "a poster",
                "options": {"wait_for_model": true},
                "parameters": {"guidance_scale": 7.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/jpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let hf = provider(&config(&server, ""));
        let uri = hf.generate("a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": "Model overloaded"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/backup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["QUJD"])))
            .expect(1)
            .mount(&server)
            .await;

        let hf = provider(&config(&server, ""));
        let uri = hf.generate("a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,QUJD");
    }

    #[tokio::test]
    async fn test_all_models_fail_reports_last_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/backup"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad prompt"})))
            .mount(&server)
            .await;

        let hf = provider(&config(&server, ""));
        let err = hf.generate("a poster").await.unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details.model.as_deref(), Some("org/backup"));
        assert_eq!(details.error.as_deref(), Some("bad prompt"));
        assert_eq!(details.status, Some(400));
    }

    #[tokio::test]
    async fn test_gone_endpoint_retries_router() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(410).set_body_json(json!({
                "error": "Please use https://router.huggingface.co/hf-inference instead"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hf-inference"))
            .and(body_partial_json(json!({"model": "org/primary", "inputs": "a poster"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"images": ["Uk9VVEVS"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let hf = provider(&config(&server, ""));
        let uri = hf.generate("a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,Uk9VVEVS");
    }

    #[tokio::test]
    async fn test_gone_without_router_hint_is_plain_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(410).set_body_json(json!({"error": "gone"})))
            .mount(&server)
            .await;

        let mut cfg = config(&server, "");
        cfg.fallbacks.clear();
        let err = provider(&cfg).generate("a poster").await.unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details.status, Some(410));
        assert_eq!(details.error.as_deref(), Some("gone"));
    }

    #[tokio::test]
    async fn test_router_transport_error_is_gone_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(410).set_body_json(json!({
                "error": "Please use https://router.huggingface.co/hf-inference instead"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server, "");
        cfg.fallbacks.clear();
        // Nothing listens on port 1
        cfg.router_endpoint = "http://127.0.0.1:1/hf-inference".into();

        let details = provider(&cfg)
            .call_model("org/primary", "a poster")
            .await
            .unwrap_err();
        assert_eq!(details.status, Some(410));
        assert_eq!(details.model.as_deref(), Some("org/primary"));
        assert!(details.error.is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_provider_route_image_wins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route/fal-ai/models/org/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8, 9, 9], "image/png"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let hf = provider(&config(&server, "fal-ai"));
        let uri = hf.generate("a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,CQkJ");
    }

    #[tokio::test]
    async fn test_provider_route_http_error_falls_through_to_direct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route/fal-ai/models/org/primary"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated_images": ["R0k="]})))
            .expect(1)
            .mount(&server)
            .await;

        let hf = provider(&config(&server, "fal-ai"));
        let uri = hf.generate("a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,R0k=");
    }

    #[tokio::test]
    async fn test_provider_route_transport_error_falls_through_to_direct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server, "fal-ai");
        cfg.provider_endpoint = "http://127.0.0.1:1".into();

        let uri = provider(&cfg).call_model("org/primary", "a poster").await.unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_provider_route_unrecognized_body_falls_through_to_direct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route/fal-ai/models/org/primary"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>queued</html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["QUJD"])))
            .expect(1)
            .mount(&server)
            .await;

        let uri = provider(&config(&server, "fal-ai"))
            .call_model("org/primary", "a poster")
            .await
            .unwrap();
        assert_eq!(uri.as_str(), "data:image/png;base64,QUJD");
    }

    #[tokio::test]
    async fn test_provider_route_json_error_ends_model_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route/fal-ai/models/org/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nsfw"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/org/primary"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut cfg = config(&server, "fal-ai");
        cfg.fallbacks.clear();
        let err = provider(&cfg).generate("a poster").await.unwrap_err();
        assert_eq!(err.details.unwrap().error.as_deref(), Some("nsfw"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_every_model() {
        let server = MockServer::start().await;
        let mut cfg = config(&server, "");
        cfg.api_key = "${UDDOKTA_TEST_NO_HF_KEY}".into();

        let err = provider(&cfg).generate("a poster").await.unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details.error.as_deref(), Some("HF_API_KEY not configured"));
        assert_eq!(details.model.as_deref(), Some("org/backup"));
    }

    #[test]
    fn test_models_order() {
        let cfg = HuggingFaceConfig::default();
        let hf = HuggingFaceProvider::new(&cfg, Duration::from_secs(1));
        assert_eq!(hf.models(), cfg.models());
        assert_eq!(hf.name(), "huggingface");
    }
}
