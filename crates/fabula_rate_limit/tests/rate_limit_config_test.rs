//! Tests for layered configuration loading.

use fabula_rate_limit::{FabulaConfig, ModelTierConfig, Tier, TierConfig};
use std::collections::HashMap;
use std::io::Write;
use tempfile::Builder;

#[test]
fn test_load_bundled_defaults() {
    let config = FabulaConfig::load().unwrap();

    assert!(config.providers.contains_key("gemini"));

    let gemini = &config.providers["gemini"];
    assert_eq!(gemini.default_tier, "free");
    assert!(gemini.tiers.contains_key("free"));
    assert!(gemini.tiers.contains_key("payasyougo"));
}

#[test]
fn test_bundled_generation_settings() {
    let config = FabulaConfig::load().unwrap();

    assert!(!config.generation.text_model.is_empty());
    assert!(!config.generation.image_model.is_empty());
    assert!(config.generation.temperature > 0.0);
}

#[test]
fn test_get_tier_with_default() {
    let config = FabulaConfig::load().unwrap();

    let tier = config.get_tier("gemini", None).unwrap();
    assert_eq!(tier.name, "Free");
}

#[test]
fn test_get_tier_with_specific_name() {
    let config = FabulaConfig::load().unwrap();

    let tier = config.get_tier("gemini", Some("payasyougo")).unwrap();
    assert_eq!(tier.name, "Pay-as-you-go");
}

#[test]
fn test_get_tier_unknown_provider() {
    let config = FabulaConfig::load().unwrap();

    assert!(config.get_tier("nonexistent", None).is_none());
    assert!(config.get_tier("gemini", Some("enterprise")).is_none());
}

#[test]
fn test_tier_config_implements_tier_trait() {
    let tier_config = TierConfig {
        name: "Test Tier".to_string(),
        rpm: Some(100),
        tpm: Some(500_000),
        rpd: Some(1000),
        max_concurrent: Some(5),
        models: HashMap::new(),
    };

    assert_eq!(tier_config.rpm(), Some(100));
    assert_eq!(tier_config.tpm(), Some(500_000));
    assert_eq!(tier_config.rpd(), Some(1000));
    assert_eq!(tier_config.max_concurrent(), Some(5));
    assert_eq!(tier_config.name(), "Test Tier");
}

#[test]
fn test_model_override_replaces_only_set_fields() {
    let mut models = HashMap::new();
    models.insert(
        "image-model".to_string(),
        ModelTierConfig {
            rpm: Some(10),
            rpd: Some(100),
            ..Default::default()
        },
    );
    let tier = TierConfig {
        name: "Free".to_string(),
        rpm: Some(15),
        tpm: Some(1_000_000),
        rpd: Some(1_500),
        max_concurrent: Some(2),
        models,
    };

    let image = tier.for_model("image-model");
    assert_eq!(image.rpm, Some(10));
    assert_eq!(image.rpd, Some(100));
    assert_eq!(image.tpm, Some(1_000_000));
    assert_eq!(image.max_concurrent, Some(2));

    let text = tier.for_model("text-model");
    assert_eq!(text, tier);
}

#[test]
fn test_config_from_file() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
port = 8080
output_dir = "/tmp/fabula-out"

[providers.test]
default_tier = "custom"

[providers.test.tiers.custom]
name = "Custom"
rpm = 42
"#
    )
    .unwrap();
    temp_file.flush().unwrap();

    let config = FabulaConfig::from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(
        config.server.output_dir,
        std::path::PathBuf::from("/tmp/fabula-out")
    );
    assert_eq!(config.generation.text_model, "gemini-2.0-flash");

    let tier = config.get_tier("test", None).unwrap();
    assert_eq!(tier.name, "Custom");
    assert_eq!(tier.rpm, Some(42));
    assert_eq!(tier.tpm, None);
}

#[test]
fn test_explicit_file_overrides_bundled() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[generation]
temperature = 0.2

[providers.gemini]
default_tier = "payasyougo"
"#
    )
    .unwrap();
    temp_file.flush().unwrap();

    let config = FabulaConfig::load_with(Some(temp_file.path())).unwrap();

    assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
    let tier = config.get_tier("gemini", None).unwrap();
    assert_eq!(tier.name, "Pay-as-you-go");
}

#[test]
fn test_missing_file_is_config_error() {
    let result = FabulaConfig::from_file("/definitely/not/here/fabula.toml");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("configuration"));
}
