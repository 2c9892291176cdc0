//! Gemini REST client with per-model rate limiting.
//!
//! [`GeminiClient`] keeps one [`RateLimiter`] per model name, created lazily
//! from the tier's model-specific overrides. Text and image models therefore
//! draw from independent quotas, as they do on the Gemini side.

use super::GeminiResult;
use super::conversion::{estimate_tokens, from_wire_response, to_wire_request};
use super::protocol::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse};
use crate::FabulaDriver;
use async_trait::async_trait;
use fabula_core::{GenerateRequest, GenerateResponse};
use fabula_error::{FabulaResult, GeminiError, GeminiErrorKind, JsonError};
use fabula_rate_limit::{RateLimiter, Tier, TierConfig};
use reqwest::Client;
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Production Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when neither the request nor the client names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Image generation can take well over a minute.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for the Gemini `generateContent` REST endpoint.
///
/// # Example
///
/// ```no_run
/// use fabula_models::GeminiClient;
/// use fabula_rate_limit::TierConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GeminiClient::with_api_key("my-key")?
///     .with_tier(TierConfig::free())
///     .with_default_model("gemini-2.0-flash");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model_name: String,
    base_tier: TierConfig,
    limiters: Arc<Mutex<HashMap<String, RateLimiter<TierConfig>>>>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let limiter_count = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("base_tier", &self.base_tier.name())
            .field("cached_limiters", &limiter_count)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client reading the key from `GEMINI_API_KEY`.
    ///
    /// An unset or empty variable fails with `MissingApiKey`.
    #[instrument(name = "gemini_client_new")]
    pub fn new() -> FabulaResult<Self> {
        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        Self::with_api_key(api_key)
    }

    /// Create a client with an explicit key, the free tier and the default model.
    pub fn with_api_key(api_key: impl Into<String>) -> FabulaResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::new(GeminiErrorKind::MissingApiKey).into());
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            base_tier: TierConfig::free(),
            limiters: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Point the client at another host, e.g. a local fake.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the rate limit tier. Existing limiters are discarded.
    pub fn with_tier(mut self, tier: TierConfig) -> Self {
        self.base_tier = tier;
        self.limiters = Arc::new(Mutex::new(HashMap::new()));
        self
    }

    /// Model used for requests that don't name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// The tier limits apply to.
    pub fn tier(&self) -> &TierConfig {
        &self.base_tier
    }

    /// Get or lazily create the limiter for `model`.
    ///
    /// Clones share quota state, so handing one out is cheap.
    fn limiter_for(&self, model: &str) -> RateLimiter<TierConfig> {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        limiters
            .entry(model.to_string())
            .or_insert_with(|| {
                let tier = self.base_tier.for_model(model);
                debug!(
                    model,
                    tier = tier.name(),
                    rpm = ?tier.rpm(),
                    max_concurrent = ?tier.max_concurrent(),
                    "Creating rate limiter for model"
                );
                RateLimiter::new(tier)
            })
            .clone()
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// One POST; returns the raw body of a 2xx response.
    async fn post_once(&self, url: &str, body: &GenerateContentRequest) -> GeminiResult<String> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeminiError::new(GeminiErrorKind::ApiRequest(e.to_string())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiError::new(GeminiErrorKind::ApiRequest(e.to_string())))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            error!(status = %status, message = %message, "Gemini API returned error");
            return Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }

        Ok(text)
    }
}

#[async_trait]
impl FabulaDriver for GeminiClient {
    #[instrument(
        skip(self, req),
        fields(
            model = req.model().as_deref().unwrap_or(self.model_name.as_str()),
            inputs = req.inputs().len(),
            wants_image = req.wants_image()
        )
    )]
    async fn generate(&self, req: &GenerateRequest) -> FabulaResult<GenerateResponse> {
        let model = req.model().clone().unwrap_or_else(|| self.model_name.clone());
        let url = self.endpoint(&model);
        let body = to_wire_request(req);
        let tokens = estimate_tokens(req);
        let limiter = self.limiter_for(&model);

        info!(estimated_tokens = tokens, "Sending Gemini request");

        let raw = limiter
            .execute(tokens, || self.post_once(&url, &body))
            .await?;

        let parsed: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            JsonError::new(format!("Failed to parse Gemini response: {}", e))
        })?;

        let response = from_wire_response(parsed)?;
        info!(outputs = response.outputs.len(), "Gemini request succeeded");
        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_missing() {
        let err = GeminiClient::with_api_key("  ").unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_endpoint_strips_models_prefix() {
        let client = GeminiClient::with_api_key("k")
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            client.endpoint("models/gemini-2.0-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_limiters_are_per_model() {
        let mut tier = TierConfig::free();
        tier.models.insert(
            "image".to_string(),
            fabula_rate_limit::ModelTierConfig {
                rpm: Some(1),
                ..Default::default()
            },
        );
        let client = GeminiClient::with_api_key("k").unwrap().with_tier(tier);

        let image = client.limiter_for("image");
        let text = client.limiter_for("text");
        assert_eq!(image.inner().rpm, Some(1));
        assert_eq!(text.inner().rpm, Some(15));

        // Cached: the second lookup shares the first one's quota.
        assert!(image.try_acquire(1).is_some());
        assert!(client.limiter_for("image").try_acquire(1).is_none());
    }
}
