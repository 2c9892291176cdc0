//! Listener configuration.

use fabula_rate_limit::ServerSettings;
use std::path::PathBuf;

/// Where the API listens and which directory it writes to.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_builder::Builder)]
#[builder(default)]
pub struct ServerConfig {
    /// Interface to bind
    #[builder(setter(into))]
    host: String,
    /// Port to bind, `0` for any free port
    port: u16,
    /// Output directory for generated images
    #[builder(setter(into))]
    output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerSettings::default().into()
    }
}

impl From<ServerSettings> for ServerConfig {
    fn from(settings: ServerSettings) -> Self {
        Self {
            host: settings.host,
            port: settings.port,
            output_dir: settings.output_dir,
        }
    }
}

impl ServerConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
