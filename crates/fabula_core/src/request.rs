//! Request and response types for LLM generation.

use crate::{Input, Output};
use serde::{Deserialize, Serialize};

/// Output modalities a request asks the model for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Text output
    #[display("TEXT")]
    Text,
    /// Image output
    #[display("IMAGE")]
    Image,
}

/// Provider-neutral generation request.
///
/// Inputs are sent as a single user turn, in order, so text and reference
/// images can be interleaved.
///
/// # Examples
///
/// ```
/// use fabula_core::{GenerateRequest, Input, Modality};
///
/// let request = GenerateRequest::builder()
///     .inputs(vec![Input::text("Draw a lighthouse")])
///     .model("gemini-2.0-flash-preview-image-generation")
///     .response_modalities(vec![Modality::Text, Modality::Image])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.inputs().len(), 1);
/// assert!(request.wants_image());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct GenerateRequest {
    /// Prompt content in send order
    #[builder(setter(into))]
    inputs: Vec<Input>,
    /// Model identifier; the driver default is used when absent
    #[builder(setter(into, strip_option))]
    model: Option<String>,
    /// Sampling temperature
    #[builder(setter(strip_option))]
    temperature: Option<f32>,
    /// Maximum number of output tokens
    #[builder(setter(strip_option))]
    max_tokens: Option<u32>,
    /// Requested output modalities (empty means provider default, text)
    #[builder(setter(into))]
    response_modalities: Vec<Modality>,
}

impl GenerateRequest {
    /// Start building a request.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }

    /// Whether the request asks for image output.
    pub fn wants_image(&self) -> bool {
        self.response_modalities.contains(&Modality::Image)
    }

    /// Concatenated text of all text inputs, newline separated.
    pub fn prompt_text(&self) -> String {
        self.inputs
            .iter()
            .filter_map(|input| match input {
                Input::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use fabula_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![
///         Output::Text("Here is your image".to_string()),
///         Output::Image { mime: Some("image/png".to_string()), data: vec![1, 2, 3] },
///     ],
/// };
///
/// assert_eq!(response.text(), "Here is your image");
/// assert_eq!(response.first_image().map(|(_, data)| data.len()), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}

impl GenerateResponse {
    /// All text outputs joined together.
    pub fn text(&self) -> String {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                Output::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The first image output as `(mime, bytes)`.
    pub fn first_image(&self) -> Option<(Option<&str>, &[u8])> {
        self.outputs.iter().find_map(|output| match output {
            Output::Image { mime, data } => Some((mime.as_deref(), data.as_slice())),
            _ => None,
        })
    }
}
