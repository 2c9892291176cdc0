//! HTTP API for the Fabula story generator.
//!
//! Each pipeline step is its own JSON endpoint backed by a shared
//! [`StoryGenerator`](fabula_story::StoryGenerator):
//!
//! | Endpoint | Step |
//! |---|---|
//! | `POST /generate-story` | storyline, cast and background settings |
//! | `POST /generate-character-image` | one character portrait |
//! | `POST /generate-background-images` | background plates |
//! | `POST /generate-scene-descriptions` | scene descriptions |
//! | `POST /generate-scene-image` | composite scene image |
//! | `POST /generate-script` | narration and dialogue |
//! | `POST /generate-audio-description` | sound design notes |
//! | `GET /files/:filename` | a generated image |
//! | `GET /health` | liveness |
//!
//! Failures are returned as `{"error": "<message>"}`: 400 for bad bodies,
//! 500 when generation fails and 404 for unknown files.
//!
//! [`StoryClient`] calls the same endpoints over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use fabula_models::GeminiClient;
//! use fabula_server::{ServerConfig, create_router, serve};
//! use fabula_storage::FileSystemStorage;
//! use fabula_story::StoryGenerator;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let generator = StoryGenerator::new(
//!     GeminiClient::new()?,
//!     FileSystemStorage::new(config.output_dir())?,
//! );
//! serve(create_router(Arc::new(generator)), &config).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod client;
mod config;
mod error;
mod routes;
mod server;
mod validation;

pub use api::{
    ApiRequest, AudioDescriptionRequest, BackgroundImagesRequest, CharacterImageRequest,
    ErrorResponse, FilenameResponse, FilenamesResponse, SceneDescriptionsRequest,
    SceneImageRequest, ScriptRequest,
};
pub use client::StoryClient;
pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ApiError;
pub use routes::{AppState, create_router};
pub use server::{serve, serve_with_shutdown};
pub use validation::{decode_image, parse_request};
