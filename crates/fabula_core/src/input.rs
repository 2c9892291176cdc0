//! Input types for LLM requests.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// A single piece of prompt content, in the order it is sent.
///
/// # Examples
///
/// ```
/// use fabula_core::{Input, MediaSource};
///
/// let text = Input::Text("Use this image as the background:".to_string());
/// let image = Input::Image {
///     mime: Some("image/png".to_string()),
///     source: MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]),
/// };
/// assert!(text.is_text());
/// assert!(!image.is_text());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP, GIF).
    Image {
        /// MIME type, e.g., "image/png" or "image/jpeg"
        mime: Option<String>,
        /// Media source (base64 or raw bytes)
        source: MediaSource,
    },
}

impl Input {
    /// Convenience constructor for text input.
    pub fn text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    /// Convenience constructor for raw image bytes.
    pub fn image(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Input::Image {
            mime: Some(mime.into()),
            source: MediaSource::Binary(data),
        }
    }

    /// Whether this input is plain text.
    pub fn is_text(&self) -> bool {
        matches!(self, Input::Text(_))
    }
}
