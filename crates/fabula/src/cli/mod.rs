//! Command-line interface module.

mod commands;
mod pipeline;
mod serve;

pub use commands::{Cli, Commands};
pub use pipeline::handle_pipeline;
pub use serve::handle_serve;
