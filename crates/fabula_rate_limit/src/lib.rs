//! Rate limiting, retry and configuration for Fabula.
//!
//! Gemini enforces per-model quotas (requests per minute, tokens per minute,
//! requests per day). This crate keeps the service inside them and retries
//! transient failures with exponential backoff.
//!
//! Configuration is layered TOML (bundled `fabula.toml`, then user files,
//! then `FABULA__*` environment variables) and also carries the server and
//! generation settings consumed by the binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod tier;

pub use config::{
    FabulaConfig, GenerationSettings, ModelTierConfig, ProviderConfig, ServerSettings, TierConfig,
};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use tier::Tier;
