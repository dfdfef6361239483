//! Configuration loading and types for inkpress.
//!
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use types::{ContentCacheMode, MarkdownConfig, SiteConfig};

/// Default name of the site configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "inkpress.yaml";

/// Prefix for environment variable overrides (`INKPRESS_OUTPUT=public`).
pub const ENV_PREFIX: &str = "INKPRESS";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),
}
