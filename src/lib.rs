pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ResolveConfig, ReviewPolicy, RunConfig};

pub use adapters::gemini::GeminiClient;
pub use adapters::github::GitHubClient;
pub use core::{engine::ReviewEngine, pipeline::ReviewPipeline};
pub use utils::error::{BotError, Result};
