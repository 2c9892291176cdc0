//! The story generation pipeline.

use crate::extraction::parse_json;
use crate::media::sniff_image_mime;
use crate::naming::{background_filename, character_filename, scene_filename, timestamp};
use crate::prompts;
use fabula_core::{
    AudioDescription, Character, GenerateRequest, Input, Modality, SceneDescriptions, Script,
    StoryData,
};
use fabula_error::{FabulaResult, GeminiError, GeminiErrorKind, StoryError, StoryErrorKind};
use fabula_models::FabulaDriver;
use fabula_storage::{MediaMetadata, MediaStorage, extension_for_mime};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Models and pacing used by [`StoryGenerator`].
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(default)]
pub struct GeneratorSettings {
    /// Model for JSON text steps
    #[builder(setter(into))]
    text_model: String,
    /// Model for portraits, backgrounds and scenes
    #[builder(setter(into))]
    image_model: String,
    /// Sampling temperature for text steps
    temperature: f32,
    /// Pause after each successful background image
    background_pause: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            temperature: 0.7,
            background_pause: Duration::from_secs(1),
        }
    }
}

impl GeneratorSettings {
    /// Start building settings from the defaults.
    pub fn builder() -> GeneratorSettingsBuilder {
        GeneratorSettingsBuilder::default()
    }
}

/// Runs each generation step against a driver, writing images to storage.
///
/// Every operation is independent; callers chain them by passing earlier
/// results (story, filenames, image bytes) into later calls.
///
/// # Example
///
/// ```no_run
/// use fabula_models::GeminiClient;
/// use fabula_storage::FileSystemStorage;
/// use fabula_story::StoryGenerator;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let generator = StoryGenerator::new(GeminiClient::new()?, FileSystemStorage::new("output")?);
/// let story = generator
///     .generate_story_and_characters("Fire", "The first spark", "Cave painting")
///     .await?;
/// for character in &story.character_descriptions {
///     generator.generate_character_image(character, "Cave painting").await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StoryGenerator<D, S> {
    driver: D,
    storage: S,
    settings: GeneratorSettings,
}

impl<D: FabulaDriver, S: MediaStorage> StoryGenerator<D, S> {
    /// Create a generator with default settings.
    pub fn new(driver: D, storage: S) -> Self {
        Self {
            driver,
            storage,
            settings: GeneratorSettings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The model driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Where generated images are written.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current settings.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Storyline, cast and five empty background settings.
    #[instrument(skip(self, description))]
    pub async fn generate_story_and_characters(
        &self,
        topic: &str,
        description: &str,
        style: &str,
    ) -> FabulaResult<StoryData> {
        info!("Generating story and characters");
        let story: StoryData = self
            .ask_json(prompts::story(topic, description, style))
            .await?;

        debug!(story = ?story, "Generated story data");
        info!(
            characters = story.character_descriptions.len(),
            backgrounds = story.background_descriptions.len(),
            "Story generated"
        );
        Ok(story)
    }

    /// Portrait of one character on a plain white background.
    ///
    /// Returns the stored filename.
    #[instrument(skip(self, character), fields(character = %character.name))]
    pub async fn generate_character_image(
        &self,
        character: &Character,
        style: &str,
    ) -> FabulaResult<String> {
        info!("Generating character image");
        let inputs = vec![Input::text(prompts::character_image(character, style))];
        let ts = timestamp();
        self.render_image(inputs, |ext| {
            character_filename(&character.name, &ts, ext)
        })
        .await
    }

    /// One empty background plate per description, generated in order.
    ///
    /// Failures are logged and skipped, so the result may be shorter than
    /// `descriptions`. After each success the generator pauses for
    /// `background_pause`.
    #[instrument(skip(self, descriptions), fields(count = descriptions.len()))]
    pub async fn generate_background_images(
        &self,
        descriptions: &[String],
        style: &str,
    ) -> FabulaResult<Vec<String>> {
        let mut filenames = Vec::with_capacity(descriptions.len());

        for (index, description) in descriptions.iter().enumerate() {
            info!(index, "Generating background image");
            let inputs = vec![Input::text(prompts::background_image(description, style))];
            let ts = timestamp();

            match self
                .render_image(inputs, |ext| background_filename(index, &ts, ext))
                .await
            {
                Ok(filename) => {
                    filenames.push(filename);
                    tokio::time::sleep(self.settings.background_pause).await;
                }
                Err(e) => warn!(index, error = %e, "Background image failed, skipping"),
            }
        }

        info!(
            generated = filenames.len(),
            requested = descriptions.len(),
            "Background images done"
        );
        Ok(filenames)
    }

    /// Scene descriptions, mapped onto `backgrounds` when any are given.
    #[instrument(skip(self, storyline, characters, backgrounds), fields(
        characters = characters.len(),
        backgrounds = backgrounds.map_or(0, <[String]>::len)
    ))]
    pub async fn generate_scene_descriptions(
        &self,
        storyline: &str,
        characters: &[Character],
        style: &str,
        backgrounds: Option<&[String]>,
    ) -> FabulaResult<SceneDescriptions> {
        info!("Generating scene descriptions");
        let scenes: SceneDescriptions = self
            .ask_json(prompts::scene_descriptions(
                storyline,
                characters,
                style,
                backgrounds,
            ))
            .await?;

        info!(scenes = scenes.scenes.len(), "Scene descriptions generated");
        Ok(scenes)
    }

    /// Composite scene built from character portraits and an optional
    /// background plate.
    ///
    /// Returns the stored filename `scene_{scene_index + 1}_...`.
    #[instrument(skip(self, scene_description, character_images, background), fields(
        references = character_images.len(),
        has_background = background.is_some()
    ))]
    pub async fn generate_scene_image_with_references(
        &self,
        scene_description: &str,
        style: &str,
        character_images: &[Vec<u8>],
        background: Option<&[u8]>,
        scene_index: usize,
    ) -> FabulaResult<String> {
        info!("Generating scene image");
        let characters: Vec<(String, Vec<u8>)> = character_images
            .iter()
            .map(|bytes| (sniff_image_mime(bytes).to_string(), bytes.clone()))
            .collect();
        let background =
            background.map(|bytes| (sniff_image_mime(bytes).to_string(), bytes.to_vec()));

        let inputs = prompts::scene_image(scene_description, style, &characters, background);
        let ts = timestamp();
        self.render_image(inputs, |ext| scene_filename(scene_index, &ts, ext))
            .await
    }

    /// Narration and dialogue for every scene.
    #[instrument(skip(self, storyline, scene_descriptions), fields(scenes = scene_descriptions.len()))]
    pub async fn generate_narration_and_dialogue(
        &self,
        storyline: &str,
        scene_descriptions: &[String],
    ) -> FabulaResult<Script> {
        info!("Generating script");
        let script: Script = self
            .ask_json(prompts::script(storyline, scene_descriptions))
            .await?;

        if script.script.len() != scene_descriptions.len() {
            warn!(
                entries = script.script.len(),
                scenes = scene_descriptions.len(),
                "Script entry count differs from scene count"
            );
        }
        Ok(script)
    }

    /// Music and sound effects for one scene.
    #[instrument(skip(self, scene_description))]
    pub async fn generate_background_audio_description(
        &self,
        scene_description: &str,
        scene_index: usize,
    ) -> FabulaResult<AudioDescription> {
        info!("Generating audio description");
        self.ask_json(prompts::audio_description(scene_description))
            .await
    }

    /// Send a text prompt to the text model and parse the JSON answer.
    async fn ask_json<T: DeserializeOwned>(&self, prompt: String) -> FabulaResult<T> {
        let request = GenerateRequest::builder()
            .inputs(vec![Input::text(prompt)])
            .model(self.settings.text_model.clone())
            .temperature(self.settings.temperature)
            .build()
            .map_err(|e| StoryError::new(StoryErrorKind::Generation(e.to_string())))?;

        let response = self.driver.generate(&request).await.inspect_err(|e| {
            error!(error = %e, model = %self.settings.text_model, "Text generation failed");
        })?;

        parse_json(&response.text())
    }

    /// Ask the image model for one image and store it under the name built
    /// from the returned MIME type's extension.
    async fn render_image(
        &self,
        inputs: Vec<Input>,
        filename: impl FnOnce(&str) -> String,
    ) -> FabulaResult<String> {
        let request = GenerateRequest::builder()
            .inputs(inputs)
            .model(self.settings.image_model.clone())
            .response_modalities(vec![Modality::Text, Modality::Image])
            .build()
            .map_err(|e| StoryError::new(StoryErrorKind::Generation(e.to_string())))?;

        let response = self.driver.generate(&request).await.inspect_err(|e| {
            error!(error = %e, model = %self.settings.image_model, "Image generation failed");
        })?;

        let Some((mime, data)) = response.first_image() else {
            let text = response.text();
            warn!(text = %text, "Image model answered without an image");
            return Err(GeminiError::new(GeminiErrorKind::NoImageData).into());
        };

        let mime = mime.unwrap_or_else(|| sniff_image_mime(data));
        let filename = filename(extension_for_mime(mime));
        let reference = self
            .storage
            .store(data, &MediaMetadata::new(filename, mime))
            .await?;

        info!(
            filename = %reference.filename,
            size = reference.size_bytes,
            "Image saved"
        );
        Ok(reference.filename)
    }
}
