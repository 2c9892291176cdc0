//! Fabula turns a topic, a description and an art style into an illustrated
//! story: storyline and cast, character portraits, background plates, scene
//! descriptions, composite scene images, a script and sound design notes.
//!
//! The `fabula` binary has two commands:
//!
//! - `fabula serve` runs the HTTP API (see [`fabula_server`]) backed by Gemini.
//! - `fabula pipeline` drives a running server through every step with
//!   [`run_pipeline`] and prints what was produced.
//!
//! # Architecture
//!
//! - `fabula_error` - Error types
//! - `fabula_core` - Story and LLM request/response types
//! - `fabula_rate_limit` - Rate limiting, retry and configuration
//! - `fabula_models` - Gemini client and the driver trait
//! - `fabula_storage` - Output directory storage
//! - `fabula_story` - Prompts, JSON extraction and the generator
//! - `fabula_server` - HTTP API and its client
//!
//! # Cargo Features
//!
//! - `observability` - export tracing spans through OpenTelemetry (stdout)
//! - `api` - enable tests that call the real Gemini API

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod logging;
#[cfg(feature = "observability")]
mod observability;
mod pipeline;

pub use logging::{env_filter, init_logging};
#[cfg(feature = "observability")]
pub use observability::{ObservabilityConfig, init_observability_with_config};
pub use pipeline::{
    CharacterImage, PipelineOptions, PipelineOptionsBuilder, PipelineReport, SceneAudio,
    SceneImage, run_pipeline,
};
