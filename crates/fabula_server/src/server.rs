//! Binding and running the API.

use crate::ServerConfig;
use axum::Router;
use fabula_error::{FabulaResult, HttpError};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// Bind `config`'s address and serve `router` until Ctrl-C.
#[instrument(skip(router), fields(address = %config.bind_address()))]
pub async fn serve(router: Router, config: &ServerConfig) -> FabulaResult<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| HttpError::new(format!("Failed to bind {}: {}", address, e)))?;

    serve_with_shutdown(listener, router, shutdown_signal()).await
}

/// Serve `router` on an already bound listener until `shutdown` completes.
///
/// In-flight requests are allowed to finish.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> FabulaResult<()> {
    let local = listener
        .local_addr()
        .map_err(|e| HttpError::new(format!("Failed to read local address: {}", e)))?;
    info!(address = %local, "Fabula API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| HttpError::new(format!("Server error: {}", e)))?;

    info!("Fabula API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
