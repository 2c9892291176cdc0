//! `fabula serve` handler.

use super::commands::ServeArgs;
use fabula_models::GeminiClient;
use fabula_rate_limit::FabulaConfig;
use fabula_server::{ServerConfig, create_router, serve};
use fabula_storage::FileSystemStorage;
use fabula_story::{GeneratorSettings, StoryGenerator};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the Gemini-backed generator from configuration and serve the API.
pub async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = FabulaConfig::load_with(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(output_dir) = args.output_dir {
        config.server.output_dir = output_dir;
    }

    let tier = config
        .get_tier("gemini", args.tier.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown Gemini tier: {}",
                args.tier.as_deref().unwrap_or("(default)")
            )
        })?;
    info!(tier = %tier.name, "Using rate limit tier");

    let generation = &config.generation;
    let client = GeminiClient::new()?
        .with_tier(tier)
        .with_default_model(generation.text_model.clone());

    let settings = GeneratorSettings::builder()
        .text_model(generation.text_model.clone())
        .image_model(generation.image_model.clone())
        .temperature(generation.temperature)
        .background_pause(Duration::from_millis(generation.background_pause_ms))
        .build()?;

    let server_config = ServerConfig::from(config.server.clone());
    let storage = FileSystemStorage::new(server_config.output_dir())?;
    let generator = StoryGenerator::new(client, storage).with_settings(settings);

    serve(create_router(Arc::new(generator)), &server_config).await?;
    Ok(())
}
