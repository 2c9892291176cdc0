//! Filesystem-backed storage rooted at the output directory.

use crate::{MediaMetadata, MediaReference, MediaStorage, validate_filename};
use fabula_error::{FabulaResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Filesystem storage backend.
///
/// Files are written flat into `base_path` under their own names:
///
/// ```text
/// output/
/// ├── char_kael_20250101120000.png
/// ├── bg_1_20250101120003.png
/// └── scene_1_20250101120010.png
/// ```
///
/// Writes go to a hidden temp file first and are renamed into place, so a
/// reader never observes a partially written image.
#[derive(Debug)]
pub struct FileSystemStorage {
    base_path: PathBuf,
    temp_counter: AtomicU64,
}

impl FileSystemStorage {
    /// Create a storage backend, creating `base_path` if needed.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryCreation` if the directory cannot be created.
    #[tracing::instrument(skip(base_path), fields(path = %base_path.as_ref().display()))]
    pub fn new(base_path: impl AsRef<Path>) -> FabulaResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Using filesystem storage");
        Ok(Self {
            base_path,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Root directory of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute SHA-256 hash of data.
    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Unique hidden sibling for the atomic write of `filename`.
    fn temp_path(&self, filename: &str) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.base_path
            .join(format!(".{}.{}-{}.tmp", filename, std::process::id(), n))
    }

    /// Map an IO error, reporting a missing file by its served name.
    fn not_found_or(
        kind: fn(String) -> StorageErrorKind,
        path: &Path,
        filename: &str,
        e: std::io::Error,
    ) -> StorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::new(StorageErrorKind::NotFound(filename.to_string()))
        } else {
            StorageError::new(kind(format!("{}: {}", path.display(), e)))
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data, metadata), fields(size = data.len(), filename = %metadata.filename))]
    async fn store(&self, data: &[u8], metadata: &MediaMetadata) -> FabulaResult<MediaReference> {
        let path = self.path_for(&metadata.filename)?;
        let hash = Self::compute_hash(data);

        let temp_path = self.temp_path(&metadata.filename);
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
            .into());
        }

        tracing::info!(
            hash = %hash,
            path = %path.display(),
            size = data.len(),
            mime_type = %metadata.mime_type,
            "Stored media file"
        );

        Ok(MediaReference {
            filename: metadata.filename.clone(),
            content_hash: hash,
            storage_backend: "filesystem".to_string(),
            storage_path: path,
            size_bytes: data.len() as u64,
            mime_type: metadata.mime_type.clone(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve(&self, filename: &str) -> FabulaResult<Vec<u8>> {
        let path = self.path_for(filename)?;

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::not_found_or(StorageErrorKind::FileRead, &path, filename, e))?;

        tracing::debug!(path = %path.display(), size = data.len(), "Retrieved media file");
        Ok(data)
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, filename: &str) -> FabulaResult<bool> {
        let path = self.path_for(filename)?;
        tokio::fs::try_exists(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, filename: &str) -> FabulaResult<()> {
        let path = self.path_for(filename)?;

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Self::not_found_or(StorageErrorKind::FileWrite, &path, filename, e))?;

        tracing::info!(path = %path.display(), "Deleted media file");
        Ok(())
    }

    fn path_for(&self, filename: &str) -> FabulaResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.base_path.join(filename))
    }
}
