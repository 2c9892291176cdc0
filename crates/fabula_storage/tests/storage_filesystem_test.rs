//! Tests for filesystem storage backend.

use fabula_error::{FabulaErrorKind, StorageErrorKind};
use fabula_storage::{FileSystemStorage, MediaMetadata, MediaStorage};
use tempfile::TempDir;

fn storage_kind(err: &fabula_error::FabulaError) -> StorageErrorKind {
    match err.kind() {
        FabulaErrorKind::Storage(e) => e.kind.clone(),
        other => panic!("expected storage error, got {other}"),
    }
}

#[tokio::test]
async fn test_store_and_retrieve() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let data = b"\x89PNG fake image";
    let metadata = MediaMetadata::new("char_kael_20250101120000.png", "image/png");

    let reference = storage.store(data, &metadata).await.unwrap();

    assert_eq!(reference.storage_backend, "filesystem");
    assert_eq!(reference.filename, "char_kael_20250101120000.png");
    assert_eq!(reference.mime_type, "image/png");
    assert_eq!(reference.size_bytes, data.len() as u64);
    assert_eq!(reference.content_hash.len(), 64);
    assert_eq!(
        reference.storage_path,
        temp_dir.path().join("char_kael_20250101120000.png")
    );

    let retrieved = storage.retrieve("char_kael_20250101120000.png").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("out").join("images");

    let storage = FileSystemStorage::new(&nested).unwrap();
    storage
        .store(b"x", &MediaMetadata::new("bg_1_20250101120000.png", "image/png"))
        .await
        .unwrap();

    assert!(nested.join("bg_1_20250101120000.png").is_file());
}

#[tokio::test]
async fn test_overwrite_replaces_content_and_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();
    let metadata = MediaMetadata::new("scene_1_20250101120000.png", "image/png");

    let first = storage.store(b"first", &metadata).await.unwrap();
    let second = storage.store(b"second", &metadata).await.unwrap();

    assert_ne!(first.content_hash, second.content_hash);
    assert_eq!(
        storage.retrieve("scene_1_20250101120000.png").await.unwrap(),
        b"second"
    );

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_exists_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();
    let metadata = MediaMetadata::new("bg_2_20250101120000.jpg", "image/jpeg");

    assert!(!storage.exists("bg_2_20250101120000.jpg").await.unwrap());
    storage.store(b"jpeg", &metadata).await.unwrap();
    assert!(storage.exists("bg_2_20250101120000.jpg").await.unwrap());

    storage.delete("bg_2_20250101120000.jpg").await.unwrap();
    assert!(!storage.exists("bg_2_20250101120000.jpg").await.unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn test_exists_reports_io_errors() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("output");
    let storage = FileSystemStorage::new(&base).unwrap();

    // Replace the output directory with a plain file so lookups fail with ENOTDIR.
    std::fs::remove_dir(&base).unwrap();
    std::fs::write(&base, b"not a directory").unwrap();

    let err = storage.exists("scene_1_20250101120000.png").await.unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::FileRead(_)));
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let err = storage.retrieve("nope.png").await.unwrap_err();
    assert_eq!(
        storage_kind(&err),
        StorageErrorKind::NotFound("nope.png".to_string())
    );

    let err = storage.delete("nope.png").await.unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path().join("out")).unwrap();
    std::fs::write(temp_dir.path().join("secret.txt"), b"secret").unwrap();

    for name in ["../secret.txt", "/etc/passwd", ".env", "sub/file.png"] {
        let err = storage.retrieve(name).await.unwrap_err();
        assert!(
            matches!(storage_kind(&err), StorageErrorKind::InvalidPath(_)),
            "{name} should be rejected"
        );
    }

    let err = storage
        .store(b"x", &MediaMetadata::new("../escape.png", "image/png"))
        .await
        .unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::InvalidPath(_)));
    assert!(!temp_dir.path().join("escape.png").exists());
}
