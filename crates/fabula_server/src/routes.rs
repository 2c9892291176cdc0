//! Route table and handlers.

use crate::validation::{decode_image, parse_request};
use crate::{
    ApiError, AudioDescriptionRequest, BackgroundImagesRequest, CharacterImageRequest,
    FilenameResponse, FilenamesResponse, SceneDescriptionsRequest, SceneImageRequest,
    ScriptRequest,
};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Router, http::StatusCode};
use fabula_core::{AudioDescription, SceneDescriptions, Script, StoryData, StoryRequest};
use fabula_error::{FabulaErrorKind, StorageErrorKind};
use fabula_models::FabulaDriver;
use fabula_storage::{MediaStorage, mime_for_extension};
use fabula_story::StoryGenerator;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

const STORY_FAILED: &str = "Story generation failed on the server.";
const CHARACTER_FAILED: &str = "Character image generation failed on the server.";
const BACKGROUNDS_FAILED: &str = "Background image generation failed on the server.";
const SCENES_FAILED: &str = "Failed to generate scene descriptions on the server.";
const SCENE_IMAGE_FAILED: &str = "Failed to generate scene image on the server.";
const SCRIPT_FAILED: &str = "Failed to generate script on the server.";
const AUDIO_FAILED: &str = "Failed to generate audio description on the server.";

/// Shared handler state.
pub type AppState<D, S> = Arc<StoryGenerator<D, S>>;

/// Build the API router around a shared generator.
///
/// Generated files are served back from the generator's storage under both
/// `/files/:filename` and `/images/:filename`.
pub fn create_router<D, S>(generator: AppState<D, S>) -> Router
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/generate-story", post(generate_story::<D, S>))
        .route(
            "/generate-character-image",
            post(generate_character_image::<D, S>),
        )
        .route(
            "/generate-background-images",
            post(generate_background_images::<D, S>),
        )
        .route(
            "/generate-scene-descriptions",
            post(generate_scene_descriptions::<D, S>),
        )
        .route("/generate-scene-image", post(generate_scene_image::<D, S>))
        .route("/generate-script", post(generate_script::<D, S>))
        .route(
            "/generate-audio-description",
            post(generate_audio_description::<D, S>),
        )
        .route("/files/:filename", get(serve_file::<D, S>))
        .route("/images/:filename", get(serve_file::<D, S>))
        .with_state(generator)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[instrument(skip_all)]
async fn generate_story<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<StoryData>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: StoryRequest = parse_request(&body)?;
    let story = generator
        .generate_story_and_characters(&request.topic, &request.description, &request.style)
        .await
        .map_err(|e| ApiError::generation(STORY_FAILED, &e))?;
    Ok(Json(story))
}

#[instrument(skip_all)]
async fn generate_character_image<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<FilenameResponse>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: CharacterImageRequest = parse_request(&body)?;
    let filename = generator
        .generate_character_image(&request.character, &request.style)
        .await
        .map_err(|e| ApiError::generation(CHARACTER_FAILED, &e))?;
    Ok(Json(FilenameResponse { filename }))
}

#[instrument(skip_all)]
async fn generate_background_images<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<FilenamesResponse>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: BackgroundImagesRequest = parse_request(&body)?;
    let filenames = generator
        .generate_background_images(&request.background_descriptions, &request.style)
        .await
        .map_err(|e| ApiError::generation(BACKGROUNDS_FAILED, &e))?;
    Ok(Json(FilenamesResponse { filenames }))
}

#[instrument(skip_all)]
async fn generate_scene_descriptions<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<SceneDescriptions>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: SceneDescriptionsRequest = parse_request(&body)?;
    let scenes = generator
        .generate_scene_descriptions(
            &request.storyline,
            &request.characters,
            &request.style,
            request.background_descriptions.as_deref(),
        )
        .await
        .map_err(|e| ApiError::generation(SCENES_FAILED, &e))?;
    Ok(Json(scenes))
}

#[instrument(skip_all)]
async fn generate_scene_image<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<FilenameResponse>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: SceneImageRequest = parse_request(&body)?;
    let character_images = request
        .character_images_base64
        .iter()
        .map(|encoded| decode_image(encoded))
        .collect::<Result<Vec<_>, _>>()?;
    let background = request
        .background_image_base64
        .as_deref()
        .map(decode_image)
        .transpose()?;

    let filename = generator
        .generate_scene_image_with_references(
            &request.scene_description,
            &request.style,
            &character_images,
            background.as_deref(),
            request.scene_index.unwrap_or(0),
        )
        .await
        .map_err(|e| ApiError::generation(SCENE_IMAGE_FAILED, &e))?;
    Ok(Json(FilenameResponse { filename }))
}

#[instrument(skip_all)]
async fn generate_script<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<Script>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: ScriptRequest = parse_request(&body)?;
    let script = generator
        .generate_narration_and_dialogue(&request.storyline, &request.scene_descriptions)
        .await
        .map_err(|e| ApiError::generation(SCRIPT_FAILED, &e))?;
    Ok(Json(script))
}

#[instrument(skip_all)]
async fn generate_audio_description<D, S>(
    State(generator): State<AppState<D, S>>,
    body: Bytes,
) -> Result<Json<AudioDescription>, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    let request: AudioDescriptionRequest = parse_request(&body)?;
    let audio = generator
        .generate_background_audio_description(
            &request.scene_description,
            request.scene_index.unwrap_or(0),
        )
        .await
        .map_err(|e| ApiError::generation(AUDIO_FAILED, &e))?;
    Ok(Json(audio))
}

#[instrument(skip(generator))]
async fn serve_file<D, S>(
    State(generator): State<AppState<D, S>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    D: FabulaDriver + 'static,
    S: MediaStorage + 'static,
{
    match generator.storage().retrieve(&filename).await {
        Ok(data) => Ok((
            [(header::CONTENT_TYPE, mime_for_extension(&filename))],
            data,
        )),
        Err(e) => {
            match e.kind() {
                FabulaErrorKind::Storage(err)
                    if matches!(
                        err.kind,
                        StorageErrorKind::NotFound(_) | StorageErrorKind::InvalidPath(_)
                    ) =>
                {
                    tracing::debug!(error = %err, "File not served");
                }
                _ => tracing::error!(error = %e, "Failed to read file"),
            }
            Err(ApiError::not_found(&filename))
        }
    }
}
