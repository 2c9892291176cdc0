//! `fabula pipeline` handler.

use super::commands::PipelineArgs;
use fabula::{PipelineOptions, run_pipeline};
use fabula_server::StoryClient;
use std::time::Duration;

/// Run the pipeline and print the report. Fails when the run stopped early.
pub async fn handle_pipeline(args: PipelineArgs) -> anyhow::Result<()> {
    let client = StoryClient::new(&args.server)?;
    client.health_check().await?;

    let options = PipelineOptions::builder()
        .topic(args.topic)
        .description(args.description)
        .style(args.style)
        .delay(Duration::from_millis(args.delay_ms))
        .build()?;

    let report = run_pipeline(&client, &options).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    if !report.complete {
        anyhow::bail!("Pipeline stopped early: {}", report.errors.join("; "));
    }
    Ok(())
}
