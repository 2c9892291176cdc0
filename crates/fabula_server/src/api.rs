//! Request and response bodies shared by the server and [`StoryClient`](crate::StoryClient).

use fabula_core::{Character, StoryRequest};
use serde::{Deserialize, Serialize};

/// A JSON request body with a fixed set of required keys.
///
/// Presence of every required key is checked before the body is
/// deserialized, so a missing key is reported by name rather than as a
/// serde error.
pub trait ApiRequest: serde::de::DeserializeOwned {
    /// Keys that must be present in the body
    const REQUIRED_FIELDS: &'static [&'static str];

    /// `(field, alias)` pairs; the alias satisfies the field's presence check
    const ALIASES: &'static [(&'static str, &'static str)] = &[];
}

impl ApiRequest for StoryRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["topic", "description", "style"];
}

/// Body of `POST /generate-character-image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterImageRequest {
    /// Character to draw
    pub character: Character,
    /// Art style
    pub style: String,
}

impl ApiRequest for CharacterImageRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["character", "style"];
}

/// Body of `POST /generate-background-images`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImagesRequest {
    /// One description per background plate
    pub background_descriptions: Vec<String>,
    /// Art style
    pub style: String,
}

impl ApiRequest for BackgroundImagesRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["background_descriptions", "style"];
}

/// Body of `POST /generate-scene-descriptions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptionsRequest {
    /// Storyline from the story step
    pub storyline: String,
    /// The cast
    pub characters: Vec<Character>,
    /// Art style
    pub style: String,
    /// Settings to map scenes onto
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_descriptions: Option<Vec<String>>,
}

impl ApiRequest for SceneDescriptionsRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["storyline", "characters", "style"];
}

/// Body of `POST /generate-scene-image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneImageRequest {
    /// What happens in the scene
    pub scene_description: String,
    /// Art style
    pub style: String,
    /// Base64 character portraits
    #[serde(alias = "character_images")]
    pub character_images_base64: Vec<String>,
    /// Base64 background plate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_base64: Option<String>,
    /// 0-based scene position, used in the filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<usize>,
}

impl ApiRequest for SceneImageRequest {
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["scene_description", "style", "character_images_base64"];
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("character_images_base64", "character_images")];
}

/// Body of `POST /generate-script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    /// Storyline from the story step
    pub storyline: String,
    /// Scene descriptions in order
    pub scene_descriptions: Vec<String>,
}

impl ApiRequest for ScriptRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["storyline", "scene_descriptions"];
}

/// Body of `POST /generate-audio-description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioDescriptionRequest {
    /// Scene to score
    pub scene_description: String,
    /// 0-based scene position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<usize>,
}

impl ApiRequest for AudioDescriptionRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["scene_description"];
}

/// `{"filename": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameResponse {
    /// Stored file name
    pub filename: String,
}

/// `{"filenames": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenamesResponse {
    /// Stored file names
    pub filenames: Vec<String>,
}

/// `{"error": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
}
