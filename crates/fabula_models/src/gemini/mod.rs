//! Google Gemini REST API client.
//!
//! - [`GeminiClient`] sends `generateContent` requests, one rate limiter per model
//! - [`protocol`](self) types mirror the JSON wire format

mod client;
mod conversion;
mod protocol;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient};
pub use protocol::{
    ApiErrorBody, ApiErrorDetail, Candidate, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InlineData, InlineDataPart, Part, PromptFeedback,
    TextPart, UsageMetadata,
};

/// Result type for Gemini operations.
pub type GeminiResult<T> = Result<T, fabula_error::GeminiError>;
