//! Conversions between Fabula's request types and the Gemini wire format.

use super::GeminiResult;
use super::protocol::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fabula_core::{GenerateRequest, GenerateResponse, Input, MediaSource, Output};
use fabula_error::{GeminiError, GeminiErrorKind};
use tracing::{debug, warn};

/// MIME type assumed for images sent without one.
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Gemini bills each inline image as a fixed number of tokens.
const TOKENS_PER_IMAGE: u64 = 258;

/// Build the wire request: all inputs in order as one user turn.
pub(crate) fn to_wire_request(req: &GenerateRequest) -> GenerateContentRequest {
    let parts = req
        .inputs()
        .iter()
        .map(|input| match input {
            Input::Text(text) => Part::text(text.clone()),
            Input::Image { mime, source } => {
                let mime = mime.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
                let data = match source {
                    MediaSource::Base64(encoded) => encoded.clone(),
                    MediaSource::Binary(bytes) => STANDARD.encode(bytes),
                };
                Part::inline_data(mime, data)
            }
        })
        .collect();

    let config = GenerationConfig {
        temperature: *req.temperature(),
        max_output_tokens: *req.max_tokens(),
        response_modalities: req.response_modalities().clone(),
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: (!config.is_empty()).then_some(config),
    }
}

/// Rough token estimate for TPM limiting: four characters per token plus a
/// flat cost per image.
pub(crate) fn estimate_tokens(req: &GenerateRequest) -> u64 {
    req.inputs()
        .iter()
        .map(|input| match input {
            Input::Text(text) => (text.len() as u64 / 4).max(1),
            Input::Image { .. } => TOKENS_PER_IMAGE,
        })
        .sum::<u64>()
        .max(1)
}

/// Convert a wire response into outputs.
///
/// - no candidates and a prompt block reason → `Blocked`
/// - no candidates otherwise → `EmptyResponse`
/// - a candidate with no usable parts stopped for a reason other than `STOP`
///   → `Blocked`
pub(crate) fn from_wire_response(
    response: GenerateContentResponse,
) -> GeminiResult<GenerateResponse> {
    if let Some(usage) = &response.usage_metadata {
        debug!(
            prompt_tokens = ?usage.prompt_token_count,
            candidate_tokens = ?usage.candidates_token_count,
            total_tokens = ?usage.total_token_count,
            "Gemini usage"
        );
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        return Err(match reason {
            Some(reason) => GeminiError::new(GeminiErrorKind::Blocked(reason)),
            None => GeminiError::new(GeminiErrorKind::EmptyResponse),
        });
    };

    let mut outputs = Vec::new();
    for part in candidate.content.map(|content| content.parts).unwrap_or_default() {
        match part {
            Part::Text(text) => outputs.push(Output::Text(text.text)),
            Part::InlineData(inline) => {
                let data = STANDARD.decode(inline.inline_data.data.as_bytes()).map_err(|e| {
                    GeminiError::new(GeminiErrorKind::Base64Decode(e.to_string()))
                })?;
                outputs.push(Output::Image {
                    mime: Some(inline.inline_data.mime_type),
                    data,
                });
            }
            Part::Other(value) => {
                warn!(part = %value, "Ignoring unsupported response part");
            }
        }
    }

    if outputs.is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if reason != "STOP" => GeminiError::new(GeminiErrorKind::Blocked(reason)),
            _ => GeminiError::new(GeminiErrorKind::EmptyResponse),
        });
    }

    Ok(GenerateResponse { outputs })
}
