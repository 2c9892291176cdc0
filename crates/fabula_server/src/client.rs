//! HTTP client for the Fabula API.

use crate::{
    AudioDescriptionRequest, BackgroundImagesRequest, CharacterImageRequest, ErrorResponse,
    FilenameResponse, FilenamesResponse, SceneDescriptionsRequest, SceneImageRequest,
    ScriptRequest,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fabula_core::{AudioDescription, Character, SceneDescriptions, Script, StoryData, StoryRequest};
use fabula_error::{FabulaResult, HttpError, JsonError};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Image endpoints can block for several minutes behind the rate limiter.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Client for a running Fabula server, one method per endpoint.
#[derive(Debug, Clone)]
pub struct StoryClient {
    base_url: String,
    client: Client,
}

impl StoryClient {
    /// Create a client for the server at `base_url`, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> FabulaResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Server root URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the server is up.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> FabulaResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Health check failed: {}", e)))?;
        Self::check(response).await?;
        debug!("Server is healthy");
        Ok(())
    }

    /// Step 1: storyline, cast and background settings.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate_story(&self, request: &StoryRequest) -> FabulaResult<StoryData> {
        self.post("/generate-story", request).await
    }

    /// Step 2: one character portrait. Returns the filename.
    #[instrument(skip(self, character), fields(character = %character.name))]
    pub async fn generate_character_image(
        &self,
        character: &Character,
        style: &str,
    ) -> FabulaResult<String> {
        let body = CharacterImageRequest {
            character: character.clone(),
            style: style.to_string(),
        };
        let response: FilenameResponse = self.post("/generate-character-image", &body).await?;
        Ok(response.filename)
    }

    /// Step 3: background plates. Returns the filenames that succeeded.
    #[instrument(skip(self, descriptions), fields(count = descriptions.len()))]
    pub async fn generate_background_images(
        &self,
        descriptions: &[String],
        style: &str,
    ) -> FabulaResult<Vec<String>> {
        let body = BackgroundImagesRequest {
            background_descriptions: descriptions.to_vec(),
            style: style.to_string(),
        };
        let response: FilenamesResponse = self.post("/generate-background-images", &body).await?;
        Ok(response.filenames)
    }

    /// Step 4: scene descriptions, mapped onto `backgrounds` when given.
    #[instrument(skip_all)]
    pub async fn generate_scene_descriptions(
        &self,
        storyline: &str,
        characters: &[Character],
        style: &str,
        backgrounds: Option<&[String]>,
    ) -> FabulaResult<SceneDescriptions> {
        let body = SceneDescriptionsRequest {
            storyline: storyline.to_string(),
            characters: characters.to_vec(),
            style: style.to_string(),
            background_descriptions: backgrounds.map(<[String]>::to_vec),
        };
        self.post("/generate-scene-descriptions", &body).await
    }

    /// Step 5: composite scene image. Images are sent base64 encoded.
    #[instrument(skip(self, scene_description, character_images, background))]
    pub async fn generate_scene_image(
        &self,
        scene_description: &str,
        style: &str,
        character_images: &[Vec<u8>],
        background: Option<&[u8]>,
        scene_index: usize,
    ) -> FabulaResult<String> {
        let body = SceneImageRequest {
            scene_description: scene_description.to_string(),
            style: style.to_string(),
            character_images_base64: character_images
                .iter()
                .map(|bytes| STANDARD.encode(bytes))
                .collect(),
            background_image_base64: background.map(|bytes| STANDARD.encode(bytes)),
            scene_index: Some(scene_index),
        };
        let response: FilenameResponse = self.post("/generate-scene-image", &body).await?;
        Ok(response.filename)
    }

    /// Step 6: narration and dialogue.
    #[instrument(skip_all)]
    pub async fn generate_script(
        &self,
        storyline: &str,
        scene_descriptions: &[String],
    ) -> FabulaResult<Script> {
        let body = ScriptRequest {
            storyline: storyline.to_string(),
            scene_descriptions: scene_descriptions.to_vec(),
        };
        self.post("/generate-script", &body).await
    }

    /// Step 7: music and sound effects for one scene.
    #[instrument(skip(self, scene_description))]
    pub async fn generate_audio_description(
        &self,
        scene_description: &str,
        scene_index: usize,
    ) -> FabulaResult<AudioDescription> {
        let body = AudioDescriptionRequest {
            scene_description: scene_description.to_string(),
            scene_index: Some(scene_index),
        };
        self.post("/generate-audio-description", &body).await
    }

    /// Fetch a generated file's bytes.
    #[instrument(skip(self))]
    pub async fn download_file(&self, filename: &str) -> FabulaResult<Vec<u8>> {
        let url = format!("{}/files/{}", self.base_url, filename);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Request to {} failed: {}", url, e)))?;

        let bytes = Self::check(response)
            .await?
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read {}: {}", filename, e)))?;
        Ok(bytes.to_vec())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> FabulaResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sending request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Request to {} failed: {}", url, e)))?;

        let text = Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "Unexpected response body");
            JsonError::new(format!("Failed to parse response from {}: {}", path, e)).into()
        })
    }

    /// Pass 2xx responses through; turn others into an error carrying the
    /// server's `error` message.
    async fn check(response: Response) -> FabulaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        error!(status = %status, message = %message, "Server returned error");
        Err(HttpError::new(format!("{} ({})", message, status.as_u16())).into())
    }
}
