//! Core data types for the Fabula story generation service.
//!
//! Two families of types live here:
//! - the story domain (requests, characters, scenes, scripts) exchanged over HTTP
//! - the provider-neutral LLM request/response types the generator speaks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;
mod media;
mod output;
mod request;
mod story;

pub use input::Input;
pub use media::MediaSource;
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse, Modality};
pub use story::{
    AudioDescription, Character, SceneDescriptions, Script, ScriptEntry, StoryData, StoryRequest,
};
