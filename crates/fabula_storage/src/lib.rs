//! Media storage for generated images.
//!
//! Generated files live flat in one output directory under the names the
//! generator chooses (`char_kael_20250101120000.png`). The same directory is
//! served back over HTTP, so every name is validated as a single safe path
//! component before it touches the filesystem.
//!
//! # Example
//!
//! ```rust
//! use fabula_storage::{FileSystemStorage, MediaMetadata, MediaStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/fabula")?;
//! let metadata = MediaMetadata::new("bg_1_20250101120000.png", "image/png");
//!
//! let reference = storage.store(&[0x89, b'P', b'N', b'G'], &metadata).await?;
//! let retrieved = storage.retrieve(&reference.filename).await?;
//! assert_eq!(retrieved.len(), 4);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod media_type;
mod reference;

pub use fabula_error::{StorageError, StorageErrorKind};
pub use filesystem::FileSystemStorage;
pub use media_type::{extension_for_mime, mime_for_extension, validate_filename};
pub use reference::{MediaMetadata, MediaReference};

use fabula_error::FabulaResult;
use std::path::PathBuf;

/// Trait for pluggable media storage backends.
///
/// Files are addressed by name. Implementations reject names that are not a
/// single safe path component with `StorageErrorKind::InvalidPath`.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `data` under `metadata.filename`, replacing any existing file.
    async fn store(&self, data: &[u8], metadata: &MediaMetadata) -> FabulaResult<MediaReference>;

    /// Read a stored file. Missing files fail with `NotFound`.
    async fn retrieve(&self, filename: &str) -> FabulaResult<Vec<u8>>;

    /// Whether a file with this name is stored.
    async fn exists(&self, filename: &str) -> FabulaResult<bool>;

    /// Remove a stored file. Missing files fail with `NotFound`.
    async fn delete(&self, filename: &str) -> FabulaResult<()>;

    /// Where `filename` lives (or would live) on disk.
    fn path_for(&self, filename: &str) -> FabulaResult<PathBuf>;
}
