//! Shared helpers for server tests.

#[allow(unused_imports)]
pub use fabula_models::mock::{JPEG_BYTES, MockDriver, MockResponse, PNG_BYTES};

use fabula_server::{AppState, create_router};
use fabula_storage::FileSystemStorage;
use fabula_story::{GeneratorSettings, StoryGenerator};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Router over a mock driver and a temporary output directory.
#[allow(dead_code)]
pub fn test_app(
    driver: &MockDriver,
) -> anyhow::Result<(TempDir, AppState<MockDriver, FileSystemStorage>, axum::Router)> {
    let dir = TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path())?;
    let settings = GeneratorSettings::builder()
        .background_pause(Duration::ZERO)
        .build()?;
    let state = Arc::new(StoryGenerator::new(driver.clone(), storage).with_settings(settings));
    let router = create_router(state.clone());
    Ok((dir, state, router))
}
