//! Fabula CLI binary.
//!
//! - `fabula serve` runs the HTTP API
//! - `fabula pipeline` drives a running server through every step

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, handle_pipeline, handle_serve};

    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    #[cfg(feature = "observability")]
    fabula::init_observability_with_config(
        fabula::ObservabilityConfig::default()
            .with_verbose(cli.verbose)
            .with_json_logs(cli.json_logs),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize observability: {}", e))?;

    #[cfg(not(feature = "observability"))]
    fabula::init_logging(cli.verbose, cli.json_logs)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args).await?,
        Commands::Pipeline(args) => handle_pipeline(args).await?,
    }

    Ok(())
}
