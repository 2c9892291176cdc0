//! The provider-neutral driver trait.

use async_trait::async_trait;
use fabula_core::{GenerateRequest, GenerateResponse};
use fabula_error::FabulaResult;
use std::sync::Arc;

/// Core trait implemented by every generation backend.
///
/// The story generator only talks to this trait, so tests can substitute a
/// scripted driver for the Gemini client.
#[async_trait]
pub trait FabulaDriver: Send + Sync {
    /// Generate model output given a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> FabulaResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier, used when a request names none.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: FabulaDriver + ?Sized> FabulaDriver for Arc<T> {
    async fn generate(&self, req: &GenerateRequest) -> FabulaResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
