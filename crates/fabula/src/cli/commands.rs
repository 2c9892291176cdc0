//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fabula - story, character and scene generation
#[derive(Parser, Debug)]
#[command(name = "fabula")]
#[command(about = "Generate illustrated stories with Gemini", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Run every generation step against a running server
    Pipeline(PipelineArgs),
}

/// Options for `fabula serve`. Unset values come from configuration.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory generated images are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Gemini rate limit tier (e.g. "free", "payasyougo")
    #[arg(long)]
    pub tier: Option<String>,

    /// Extra configuration file, applied over ./fabula.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Options for `fabula pipeline`.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PipelineArgs {
    /// Story topic
    #[arg(long)]
    pub topic: String,

    /// What should happen in the story
    #[arg(long)]
    pub description: String,

    /// Art and narrative style
    #[arg(long)]
    pub style: String,

    /// Server base URL
    #[arg(long, env = "FABULA_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub delay_ms: u64,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}
