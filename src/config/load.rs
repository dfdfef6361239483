//! Configuration loading from files.

use std::path::{Path, PathBuf};

use super::{ConfigError, DEFAULT_CONFIG_FILE, ENV_PREFIX, SiteConfig};

impl SiteConfig {
    /// Resolve the config path from the command line argument, defaulting to
    /// `inkpress.yaml` in the current directory.
    pub fn resolve_path(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        if config_file.is_relative() {
            Ok(std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file))
        } else {
            Ok(config_file.to_path_buf())
        }
    }

    /// Load the config from a file path, layering `INKPRESS_*` environment
    /// variables on top.
    ///
    /// A missing file is not an error: every key has a default.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<SiteConfig>()?;

        tracing::debug!(path = %path.display(), "loaded site config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkpress.yaml");
        std::fs::write(
            &path,
            "title: My Blog\ntag_title_prefix: \"Tag: \"\npaginate: 5\n",
        )
        .unwrap();

        let config = SiteConfig::load_from_file(&path).unwrap();
        assert_eq!(config.title.as_deref(), Some("My Blog"));
        assert_eq!(config.tag_title_prefix, "Tag: ");
        assert_eq!(config.paginate, 5);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load_from_file(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.output, PathBuf::from("_site"));
    }
}
