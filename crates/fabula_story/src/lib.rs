//! Story, character and scene generation.
//!
//! [`StoryGenerator`] runs each step of the pipeline against a
//! [`FabulaDriver`](fabula_models::FabulaDriver) and writes images through a
//! [`MediaStorage`](fabula_storage::MediaStorage):
//!
//! 1. storyline, cast and background settings (JSON from the text model)
//! 2. one portrait per character on plain white
//! 3. one empty background plate per setting
//! 4. scene descriptions placing the cast in those settings
//! 5. composite scene images built from the portraits and a background
//! 6. narration and dialogue per scene
//! 7. music and sound effect notes per scene
//!
//! Model text is turned into typed data with [`extract_json`], which
//! tolerates markdown fences and chatter around the JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod generator;
mod media;
mod naming;
pub mod prompts;

pub use extraction::{extract_json, parse_json};
pub use generator::{GeneratorSettings, GeneratorSettingsBuilder, StoryGenerator};
pub use media::sniff_image_mime;
pub use naming::{
    background_filename, character_filename, sanitize_name, scene_filename, timestamp,
};
