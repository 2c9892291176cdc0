//! End-to-end pipeline driven through the HTTP API.

use fabula_core::{AudioDescription, Script, StoryData, StoryRequest};
use fabula_error::FabulaError;
use fabula_server::StoryClient;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// What to generate and how fast to go.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
pub struct PipelineOptions {
    /// Story topic
    #[builder(setter(into))]
    topic: String,
    /// What should happen
    #[builder(setter(into))]
    description: String,
    /// Art and narrative style
    #[builder(setter(into))]
    style: String,
    /// Pause between consecutive requests
    #[builder(default = "Duration::from_millis(2000)")]
    delay: Duration,
}

impl PipelineOptions {
    /// Start building options.
    pub fn builder() -> PipelineOptionsBuilder {
        PipelineOptionsBuilder::default()
    }
}

/// A portrait produced for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterImage {
    /// Character name
    pub name: String,
    /// Stored file name
    pub filename: String,
}

/// A composite image produced for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneImage {
    /// 0-based scene index
    pub scene: usize,
    /// Background file used
    pub background: String,
    /// Stored file name
    pub filename: String,
}

/// Sound design for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneAudio {
    /// 0-based scene index
    pub scene: usize,
    /// Music and effects notes
    pub audio_description: String,
}

/// Everything a pipeline run produced, plus the failures it stepped over.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PipelineReport {
    /// Storyline, cast and backgrounds
    pub story: Option<StoryData>,
    /// Character portraits
    pub character_images: Vec<CharacterImage>,
    /// Background plates
    pub background_images: Vec<String>,
    /// Scene descriptions
    pub scenes: Vec<String>,
    /// Composite scene images
    pub scene_images: Vec<SceneImage>,
    /// Narration and dialogue
    pub script: Option<Script>,
    /// Audio descriptions
    pub audio: Vec<SceneAudio>,
    /// Failures, one line each
    pub errors: Vec<String>,
    /// False when a required step failed and the run stopped
    pub complete: bool,
}

impl PipelineReport {
    fn record(&mut self, step: &str, err: &FabulaError) {
        warn!(step, error = %err, "Pipeline step failed");
        self.errors.push(format!("{}: {}", step, err));
    }

    /// Human readable summary of every generated asset.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.story {
            Some(story) => {
                lines.push("Storyline:".to_string());
                lines.push(story.storyline.clone());
                lines.push(String::new());
            }
            None => lines.push("No story was generated.".to_string()),
        }

        lines.push(format!("Character images ({}):", self.character_images.len()));
        lines.extend(
            self.character_images
                .iter()
                .map(|image| format!("  {}: {}", image.name, image.filename)),
        );

        lines.push(format!("Background images ({}):", self.background_images.len()));
        lines.extend(self.background_images.iter().map(|f| format!("  {}", f)));

        lines.push(format!("Scenes ({}):", self.scenes.len()));
        for (index, scene) in self.scenes.iter().enumerate() {
            lines.push(format!("  {}. {}", index + 1, scene));
            if let Some(image) = self.scene_images.iter().find(|i| i.scene == index) {
                lines.push(format!("     image: {}", image.filename));
            }
            if let Some(entry) = self
                .script
                .as_ref()
                .and_then(|script| script.script.get(index))
            {
                lines.push(format!("     narration: {}", entry.narration));
                for line in entry.dialogue.lines() {
                    lines.push(format!("     {}", line));
                }
            }
            if let Some(audio) = self.audio.iter().find(|a| a.scene == index) {
                lines.push(format!("     audio: {}", audio.audio_description));
            }
        }

        if !self.errors.is_empty() {
            lines.push(format!("Errors ({}):", self.errors.len()));
            lines.extend(self.errors.iter().map(|e| format!("  {}", e)));
        }

        lines.join("\n")
    }
}

/// Run steps 1 to 7 in order against a server.
///
/// Character, background, scene image, script and audio failures are
/// recorded and skipped. A failed story or scene description step stops the
/// run with `complete == false`.
#[instrument(skip_all, fields(topic = %options.topic))]
pub async fn run_pipeline(client: &StoryClient, options: &PipelineOptions) -> PipelineReport {
    let mut report = PipelineReport::default();
    let pause = || tokio::time::sleep(options.delay);

    info!("Step 1: story and characters");
    let request = StoryRequest {
        topic: options.topic.clone(),
        description: options.description.clone(),
        style: options.style.clone(),
    };
    let story = match client.generate_story(&request).await {
        Ok(story) => story,
        Err(e) => {
            report.record("story", &e);
            return report;
        }
    };
    report.story = Some(story.clone());
    pause().await;

    info!(count = story.character_descriptions.len(), "Step 2: character images");
    let mut character_bytes = Vec::new();
    for character in &story.character_descriptions {
        let result = match client
            .generate_character_image(character, &options.style)
            .await
        {
            Ok(filename) => client
                .download_file(&filename)
                .await
                .map(|bytes| (filename, bytes)),
            Err(e) => Err(e),
        };
        match result {
            Ok((filename, bytes)) => {
                report.character_images.push(CharacterImage {
                    name: character.name.clone(),
                    filename,
                });
                character_bytes.push(bytes);
            }
            Err(e) => report.record(&format!("character image for {}", character.name), &e),
        }
        pause().await;
    }

    info!(count = story.background_descriptions.len(), "Step 3: background images");
    let mut backgrounds = Vec::new();
    if !story.background_descriptions.is_empty() {
        match client
            .generate_background_images(&story.background_descriptions, &options.style)
            .await
        {
            Ok(filenames) => {
                for filename in filenames {
                    match client.download_file(&filename).await {
                        Ok(bytes) => {
                            report.background_images.push(filename.clone());
                            backgrounds.push((filename, bytes));
                        }
                        Err(e) => report.record(&format!("download {}", filename), &e),
                    }
                }
            }
            Err(e) => report.record("background images", &e),
        }
        pause().await;
    }

    info!("Step 4: scene descriptions");
    let background_descriptions = (!story.background_descriptions.is_empty())
        .then_some(story.background_descriptions.as_slice());
    match client
        .generate_scene_descriptions(
            &story.storyline,
            &story.character_descriptions,
            &options.style,
            background_descriptions,
        )
        .await
    {
        Ok(scenes) => report.scenes = scenes.scenes,
        Err(e) => {
            report.record("scene descriptions", &e);
            return report;
        }
    }
    pause().await;

    if backgrounds.is_empty() || character_bytes.is_empty() {
        info!(
            backgrounds = backgrounds.len(),
            characters = character_bytes.len(),
            "Step 5 skipped: scene images need backgrounds and character images"
        );
    } else {
        info!(count = report.scenes.len(), "Step 5: scene images");
        for (index, scene) in report.scenes.clone().iter().enumerate() {
            let (background_name, background_bytes) = &backgrounds[index % backgrounds.len()];
            match client
                .generate_scene_image(
                    scene,
                    &options.style,
                    &character_bytes,
                    Some(background_bytes.as_slice()),
                    index,
                )
                .await
            {
                Ok(filename) => report.scene_images.push(SceneImage {
                    scene: index,
                    background: background_name.clone(),
                    filename,
                }),
                Err(e) => report.record(&format!("scene image {}", index + 1), &e),
            }
            pause().await;
        }
    }

    info!("Step 6: script");
    match client.generate_script(&story.storyline, &report.scenes).await {
        Ok(script) => report.script = Some(script),
        Err(e) => report.record("script", &e),
    }
    pause().await;

    info!("Step 7: audio descriptions");
    for (index, scene) in report.scenes.clone().iter().enumerate() {
        match client.generate_audio_description(scene, index).await {
            Ok(AudioDescription { audio_description }) => report.audio.push(SceneAudio {
                scene: index,
                audio_description,
            }),
            Err(e) => report.record(&format!("audio description {}", index + 1), &e),
        }
        pause().await;
    }

    report.complete = true;
    info!(
        characters = report.character_images.len(),
        backgrounds = report.background_images.len(),
        scenes = report.scenes.len(),
        scene_images = report.scene_images.len(),
        errors = report.errors.len(),
        "Pipeline finished"
    );
    report
}
