//! Layered TOML configuration.
//!
//! Sources, lowest precedence first:
//! 1. Bundled defaults (`include_str!` of the workspace `fabula.toml`)
//! 2. `~/.config/fabula/fabula.toml`
//! 3. `./fabula.toml`
//! 4. An explicit file passed to [`FabulaConfig::load_with`]
//! 5. `FABULA__SECTION__KEY` environment variables

use crate::Tier;
use config::{Config, Environment, File, FileFormat};
use fabula_error::{ConfigError, FabulaError, FabulaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../fabula.toml");

/// Model-specific rate limit overrides.
///
/// Only the fields that are set replace the tier defaults.
///
/// ```toml
/// [providers.gemini.tiers.free.models."gemini-2.0-flash-preview-image-generation"]
/// rpm = 10
/// rpd = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ModelTierConfig {
    /// Requests per minute limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    /// Tokens per minute limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm: Option<u64>,
    /// Requests per day limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpd: Option<u32>,
    /// Maximum concurrent requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

/// Configuration for a specific API tier.
///
/// ```toml
/// [providers.gemini.tiers.free]
/// name = "Free"
/// rpm = 15
/// rpd = 1_500
/// max_concurrent = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierConfig {
    /// Name of the tier
    pub name: String,
    /// Requests per minute limit
    #[serde(default)]
    pub rpm: Option<u32>,
    /// Tokens per minute limit
    #[serde(default)]
    pub tpm: Option<u64>,
    /// Requests per day limit
    #[serde(default)]
    pub rpd: Option<u32>,
    /// Maximum concurrent requests
    #[serde(default)]
    pub max_concurrent: Option<u32>,
    /// Model-specific overrides
    #[serde(default)]
    pub models: HashMap<String, ModelTierConfig>,
}

impl Tier for TierConfig {
    fn rpm(&self) -> Option<u32> {
        self.rpm
    }

    fn tpm(&self) -> Option<u64> {
        self.tpm
    }

    fn rpd(&self) -> Option<u32> {
        self.rpd
    }

    fn max_concurrent(&self) -> Option<u32> {
        self.max_concurrent
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TierConfig {
    /// Tier used when no configuration names one: Gemini's free tier.
    pub fn free() -> Self {
        Self {
            name: "Free".to_string(),
            rpm: Some(15),
            tpm: Some(1_000_000),
            rpd: Some(1_500),
            max_concurrent: Some(2),
            models: HashMap::new(),
        }
    }

    /// A tier that never waits. Useful for tests and local fakes.
    pub fn unlimited() -> Self {
        Self {
            name: "Unlimited".to_string(),
            rpm: None,
            tpm: None,
            rpd: None,
            max_concurrent: None,
            models: HashMap::new(),
        }
    }

    /// Tier limits with the overrides for `model_name` applied.
    pub fn for_model(&self, model_name: &str) -> TierConfig {
        match self.models.get(model_name) {
            Some(model) => TierConfig {
                name: self.name.clone(),
                rpm: model.rpm.or(self.rpm),
                tpm: model.tpm.or(self.tpm),
                rpd: model.rpd.or(self.rpd),
                max_concurrent: model.max_concurrent.or(self.max_concurrent),
                models: HashMap::new(),
            },
            None => self.clone(),
        }
    }
}

/// Default tier and known tiers for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Name of the default tier for this provider
    pub default_tier: String,
    /// Map of tier name to tier configuration
    #[serde(default)]
    pub tiers: HashMap<String, TierConfig>,
}

/// Where the HTTP API listens and writes files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Directory generated images are written to and served from
    pub output_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Models and sampling used by the story generator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model for story, scene, script and audio text
    pub text_model: String,
    /// Model for character, background and scene images
    pub image_model: String,
    /// Sampling temperature for text generation
    pub temperature: f32,
    /// Pause after each background image, in milliseconds
    pub background_pause_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            temperature: 0.7,
            background_pause_ms: 1000,
        }
    }
}

/// Top-level Fabula configuration.
///
/// # Example
///
/// ```no_run
/// use fabula_rate_limit::FabulaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FabulaConfig::load()?;
/// println!("serving on port {}", config.server.port);
/// let tier = config.get_tier("gemini", None).unwrap();
/// println!("Gemini RPM: {:?}", tier.rpm);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct FabulaConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Generation settings
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl FabulaConfig {
    /// Load configuration from a single file, without defaults or overrides.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FabulaResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load bundled defaults merged with user files and environment overrides.
    pub fn load() -> FabulaResult<Self> {
        Self::load_with(None)
    }

    /// Like [`FabulaConfig::load`], with an optional explicit file that takes
    /// precedence over every file source.
    #[instrument]
    pub fn load_with(explicit: Option<&Path>) -> FabulaResult<Self> {
        debug!("Loading configuration: env > explicit > ./fabula.toml > home > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/fabula/fabula.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("fabula").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("FABULA")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Tier configuration for a provider, falling back to its default tier.
    #[instrument(skip(self))]
    pub fn get_tier(&self, provider: &str, tier_name: Option<&str>) -> Option<TierConfig> {
        let provider_config = self.providers.get(provider)?;
        let tier = tier_name.unwrap_or(&provider_config.default_tier);

        debug!(provider, tier, "Looking up tier configuration");

        provider_config.tiers.get(tier).cloned()
    }
}
