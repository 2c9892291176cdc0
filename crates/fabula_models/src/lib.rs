//! Generation backends for Fabula.
//!
//! [`FabulaDriver`] is the seam between the story generator and a model
//! provider. [`GeminiClient`] implements it over the Gemini REST API with
//! per-model rate limiting and retry.
//!
//! # Example
//!
//! ```no_run
//! use fabula_core::{GenerateRequest, Input};
//! use fabula_models::{FabulaDriver, GeminiClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new()?;
//! let request = GenerateRequest::builder()
//!     .inputs(vec![Input::text("Hello")])
//!     .build()?;
//! let response = client.generate(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod gemini;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use driver::FabulaDriver;
pub use gemini::{
    ApiErrorBody, ApiErrorDetail, Candidate, Content, DEFAULT_BASE_URL, DEFAULT_MODEL,
    GeminiClient, GeminiResult, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineData, InlineDataPart, Part, PromptFeedback, TextPart, UsageMetadata,
};
