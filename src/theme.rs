use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Optional metadata file at the root of a theme directory.
pub const THEME_CONFIG_FILE: &str = "theme.yaml";

/// Directory inside a theme holding its templates.
pub const TEMPLATES_DIR: &str = "templates";

/// Theme configuration loaded from theme.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme metadata
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form theme settings
    #[serde(flatten)]
    pub settings: HashMap<String, serde_json::Value>,
}

/// A theme directory and its configuration.
#[derive(Debug, Clone)]
pub struct Theme {
    pub path: PathBuf,
    pub config: ThemeConfig,
}

impl Theme {
    /// Load a theme from its directory.
    /// The config file is optional; the directory is not.
    pub fn load(theme_path: &Path) -> Result<Self, ThemeError> {
        if !theme_path.is_dir() {
            return Err(ThemeError::Missing(theme_path.to_path_buf()));
        }

        let config_path = theme_path.join(THEME_CONFIG_FILE);
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ThemeError::Io(config_path.clone(), e))?;
            serde_yaml::from_str(&content).map_err(|e| ThemeError::Parse(config_path.clone(), e))?
        } else {
            ThemeConfig::default()
        };

        Ok(Self {
            path: theme_path.to_path_buf(),
            config,
        })
    }

    /// The configured name, or the directory name.
    pub fn name(&self) -> String {
        self.config.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.path.join(TEMPLATES_DIR)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ThemeError {
    #[error("theme directory not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read theme config {path}: {1}", path = .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse theme config {path}: {1}", path = .0.display())]
    Parse(PathBuf, serde_yaml::Error),
}
