//! Scripted driver for tests that must not touch the network.
//!
//! Enabled with the `mock` feature. Downstream crates pull it in as a
//! dev-dependency feature:
//!
//! ```toml
//! [dev-dependencies]
//! fabula_models = { workspace = true, features = ["mock"] }
//! ```

use crate::FabulaDriver;
use async_trait::async_trait;
use fabula_core::{GenerateRequest, GenerateResponse, Output};
use fabula_error::{FabulaError, FabulaResult, GeminiError, GeminiErrorKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Minimal PNG signature followed by filler bytes.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

/// Minimal JPEG signature followed by filler bytes.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 4, 5, 6];

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Text output
    Text(String),
    /// Image output with an optional MIME type
    Image(Option<String>, Vec<u8>),
    /// Driver error
    Error(GeminiErrorKind),
}

impl MockResponse {
    /// Text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// A PNG image declared as `image/png`.
    pub fn png() -> Self {
        Self::Image(Some("image/png".to_string()), PNG_BYTES.to_vec())
    }
}

/// Driver that replays responses in order and records every request.
///
/// Image answers come with a short text part, as Gemini's do. Calls past the
/// end of the script fail with an `ApiRequest` error.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    responses: Arc<Vec<MockResponse>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockDriver {
    /// Replay `responses` in order.
    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(responses),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times `generate()` was called.
    pub fn call_count(&self) -> usize {
        self.recorded().len()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.recorded().clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<GenerateRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FabulaDriver for MockDriver {
    async fn generate(&self, req: &GenerateRequest) -> FabulaResult<GenerateResponse> {
        let index = {
            let mut requests = self.recorded();
            requests.push(req.clone());
            requests.len() - 1
        };

        match self.responses.get(index) {
            Some(MockResponse::Text(text)) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text.clone())],
            }),
            Some(MockResponse::Image(mime, data)) => Ok(GenerateResponse {
                outputs: vec![
                    Output::Text("Here is your image.".to_string()),
                    Output::Image {
                        mime: mime.clone(),
                        data: data.clone(),
                    },
                ],
            }),
            Some(MockResponse::Error(kind)) => {
                Err(FabulaError::from(GeminiError::new(kind.clone())))
            }
            None => Err(FabulaError::from(GeminiError::new(
                GeminiErrorKind::ApiRequest(format!(
                    "Mock sequence exhausted (call {} beyond {} responses)",
                    index + 1,
                    self.responses.len()
                )),
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::Input;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest::builder()
            .inputs(vec![Input::text(prompt)])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_replays_in_order_and_records_requests() {
        let driver = MockDriver::new_sequence(vec![MockResponse::text("one"), MockResponse::png()]);

        let first = driver.generate(&request("a")).await.unwrap();
        assert_eq!(first.text(), "one");
        let second = driver.generate(&request("b")).await.unwrap();
        assert_eq!(second.outputs.len(), 2);

        assert_eq!(driver.call_count(), 2);
        assert_eq!(driver.requests()[1].prompt_text(), "b");
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let driver = MockDriver::new_sequence(vec![]);
        let err = driver.generate(&request("a")).await.unwrap_err();
        assert!(err.to_string().contains("Mock sequence exhausted"));
    }
}
