//! Errors raised while validating requests and turning model output into story data.

/// Story pipeline error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoryErrorKind {
    /// Request body lacks one or more required fields
    #[display(
        "Missing required {}: {}",
        if _0.len() == 1 { "field" } else { "fields" },
        _0.join(", ")
    )]
    MissingFields(Vec<String>),
    /// Request body fields are present but malformed
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// A reference image was not valid base64
    #[display("Invalid Base64 image data provided: {}", _0)]
    InvalidBase64(String),
    /// Model output contained no JSON value
    #[display("No JSON found in model response (length: {})", _0)]
    NoJsonFound(usize),
    /// JSON was found but did not match the expected shape
    #[display("Failed to parse model response: {}", _0)]
    Parse(String),
    /// Generation produced no usable result
    #[display("Generation failed: {}", _0)]
    Generation(String),
}

impl StoryErrorKind {
    /// Whether the caller, rather than the model or the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoryErrorKind::MissingFields(_)
                | StoryErrorKind::InvalidRequest(_)
                | StoryErrorKind::InvalidBase64(_)
        )
    }
}

/// Story error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{StoryError, StoryErrorKind};
///
/// let err = StoryError::new(StoryErrorKind::MissingFields(vec![
///     "topic".to_string(),
///     "style".to_string(),
/// ]));
/// assert!(format!("{}", err).contains("Missing required fields: topic, style"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Story Error: {} at line {} in {}", kind, line, file)]
pub struct StoryError {
    /// The kind of error that occurred
    pub kind: StoryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoryError {
    /// Create a new story error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
