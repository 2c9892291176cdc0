mod test_utils;

use fabula::{PipelineOptions, run_pipeline};
use fabula_error::GeminiErrorKind;
use std::time::Duration;
use test_utils::{MockDriver, MockResponse, spawn_server};

fn options() -> PipelineOptions {
    PipelineOptions::builder()
        .topic("Fire")
        .description("The first spark")
        .style("Cave painting")
        .delay(Duration::ZERO)
        .build()
        .unwrap()
}

const STORY: &str = r#"{
  "storyline": "Kael and Lyra find fire.",
  "character_descriptions": [
    {"name": "Kael", "traits": "brave", "appearance": "tall"},
    {"name": "Lyra", "traits": "wise", "appearance": "small"}
  ],
  "background_descriptions": ["A cave mouth", "A burning forest"]
}"#;

#[tokio::test]
async fn test_full_run_maps_backgrounds_round_robin() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new_sequence(vec![
        MockResponse::text(STORY),
        MockResponse::png(),
        MockResponse::Error(GeminiErrorKind::Blocked("IMAGE_SAFETY".to_string())),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::text(r#"{"scenes": ["Dawn.", "Noon.", "Dusk."]}"#),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::text(
            r#"{"script": [
                {"scene": 1, "narration": "Dawn breaks.", "dialogue": "Kael: Look!"},
                {"scene": 2, "narration": "Noon.", "dialogue": ""},
                {"scene": 3, "narration": "Dusk.", "dialogue": "Lyra: Warm."}
            ]}"#,
        ),
        MockResponse::text(r#"{"audio_description": "Birdsong"}"#),
        MockResponse::text(r#"{"audio_description": "Crackling"}"#),
        MockResponse::text(r#"{"audio_description": "Crickets"}"#),
    ]);
    let server = spawn_server(&driver).await?;

    let report = run_pipeline(&server.client, &options()).await;

    assert!(report.complete);
    assert_eq!(driver.call_count(), 13);
    assert_eq!(report.character_images.len(), 1);
    assert_eq!(report.character_images[0].name, "Kael");
    assert_eq!(report.background_images.len(), 2);
    assert_eq!(report.scenes.len(), 3);

    assert_eq!(report.scene_images.len(), 3);
    assert_eq!(report.scene_images[0].background, report.background_images[0]);
    assert_eq!(report.scene_images[1].background, report.background_images[1]);
    assert_eq!(report.scene_images[2].background, report.background_images[0]);
    assert!(report.scene_images[2].filename.starts_with("scene_3_"));

    assert_eq!(report.script.as_ref().map(|s| s.script.len()), Some(3));
    let audio: Vec<_> = report
        .audio
        .iter()
        .map(|a| a.audio_description.as_str())
        .collect();
    assert_eq!(audio, vec!["Birdsong", "Crackling", "Crickets"]);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("character image for Lyra"));

    // The mapped scene prompt saw the story's backgrounds.
    assert!(driver.requests()[5].prompt_text().contains("A burning forest"));

    let summary = report.summary();
    assert!(summary.contains("Kael and Lyra find fire."));
    assert!(summary.contains("Lyra: Warm."));
    assert!(summary.contains("audio: Crickets"));
    Ok(())
}

#[tokio::test]
async fn test_story_failure_stops_the_run() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new_sequence(vec![MockResponse::text("no json")]);
    let server = spawn_server(&driver).await?;

    let report = run_pipeline(&server.client, &options()).await;

    assert!(!report.complete);
    assert!(report.story.is_none());
    assert_eq!(driver.call_count(), 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Story generation failed on the server."));
    Ok(())
}

#[tokio::test]
async fn test_without_backgrounds_scene_images_are_skipped() -> Result<(), Box<dyn std::error::Error>>
{
    let driver = MockDriver::new_sequence(vec![
        MockResponse::text(
            r#"{"storyline": "Volt explores.", "character_descriptions": [{"name": "Volt"}]}"#,
        ),
        MockResponse::png(),
        MockResponse::text(r#"{"scenes": ["Volt wakes.", "Volt sparks."]}"#),
        MockResponse::text(r#"{"script": []}"#),
        MockResponse::text(r#"{"audio_description": "Hum"}"#),
        MockResponse::text(r#"{"audio_description": "Zap"}"#),
    ]);
    let server = spawn_server(&driver).await?;

    let report = run_pipeline(&server.client, &options()).await;

    assert!(report.complete);
    assert_eq!(driver.call_count(), 6);
    assert!(report.background_images.is_empty());
    assert!(report.scene_images.is_empty());
    assert_eq!(report.audio.len(), 2);
    assert!(driver.requests()[2].prompt_text().contains("3 to 5"));
    assert!(report.errors.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_scene_failure_keeps_earlier_assets() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new_sequence(vec![
        MockResponse::text(STORY),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::png(),
        MockResponse::Error(GeminiErrorKind::HttpError {
            status_code: 400,
            message: "bad".to_string(),
        }),
    ]);
    let server = spawn_server(&driver).await?;

    let report = run_pipeline(&server.client, &options()).await;

    assert!(!report.complete);
    assert_eq!(report.character_images.len(), 2);
    assert_eq!(report.background_images.len(), 2);
    assert!(report.scenes.is_empty());
    assert!(report.errors[0].contains("Failed to generate scene descriptions on the server."));
    assert!(std::fs::read_dir(server.dir.path())?.count() >= 4);
    Ok(())
}

#[tokio::test]
async fn test_report_serializes_for_json_output() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new_sequence(vec![MockResponse::text("no json")]);
    let server = spawn_server(&driver).await?;

    let report = run_pipeline(&server.client, &options()).await;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["complete"], false);
    assert!(json["story"].is_null());
    assert_eq!(json["errors"].as_array().map(Vec::len), Some(1));
    Ok(())
}
