//! Metadata passed to, and references returned from, storage backends.

use std::path::PathBuf;

/// What to store a file as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaMetadata {
    /// Target file name, a single path component
    pub filename: String,
    /// MIME type (e.g., "image/png")
    pub mime_type: String,
}

impl MediaMetadata {
    /// Metadata for `filename` with the given MIME type.
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Reference to stored media.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaReference {
    /// Name the file is served under
    pub filename: String,
    /// SHA-256 hash of the content, lowercase hex
    pub content_hash: String,
    /// Storage backend name (e.g., "filesystem")
    pub storage_backend: String,
    /// Absolute or base-relative location of the file
    pub storage_path: PathBuf,
    /// Size of the media in bytes
    pub size_bytes: u64,
    /// MIME type
    pub mime_type: String,
}
