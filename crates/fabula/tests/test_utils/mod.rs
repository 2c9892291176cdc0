//! Shared helpers for pipeline tests.

#[allow(unused_imports)]
pub use fabula_models::mock::{JPEG_BYTES, MockDriver, MockResponse, PNG_BYTES};

use fabula_server::{StoryClient, create_router, serve_with_shutdown};
use fabula_storage::FileSystemStorage;
use fabula_story::{GeneratorSettings, StoryGenerator};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A live server over a mock driver. Stops when dropped.
pub struct TestServer {
    pub client: StoryClient,
    pub dir: TempDir,
    _stop: oneshot::Sender<()>,
}

pub async fn spawn_server(driver: &MockDriver) -> Result<TestServer, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let storage = FileSystemStorage::new(dir.path())?;
    let settings = GeneratorSettings::builder()
        .background_pause(Duration::ZERO)
        .build()?;
    let generator = StoryGenerator::new(driver.clone(), storage).with_settings(settings);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(serve_with_shutdown(
        listener,
        create_router(Arc::new(generator)),
        async move {
            let _ = stopped.await;
        },
    ));

    Ok(TestServer {
        client: StoryClient::new(format!("http://{address}"))?,
        dir,
        _stop: stop,
    })
}
