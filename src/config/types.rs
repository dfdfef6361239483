//! Configuration type definitions.
//!
//! This module contains the data structures read from `inkpress.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// Root site configuration.
///
/// Every key has a default so an empty file (or no file at all) is a valid
/// configuration. Keys the build does not know about are kept in `extra` and
/// exposed to templates as `site.*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title
    #[serde(default)]
    pub title: Option<String>,
    /// Absolute site URL used for canonical links (e.g. "https://example.com")
    #[serde(default)]
    pub url: Option<String>,
    /// Content root, relative to the config file
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Output root, relative to the config file
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Theme directory, relative to the config file
    #[serde(default = "default_theme")]
    pub theme: PathBuf,
    /// Permalink pattern for posts
    #[serde(default = "default_permalink")]
    pub permalink: String,
    /// Date display format (`ordinal`, Java-style tokens or strftime)
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub tag_title_prefix: String,
    #[serde(default)]
    pub category_title_prefix: String,
    /// URL directory holding tag index pages
    #[serde(default = "default_tag_dir")]
    pub tag_dir: String,
    /// URL directory holding category index pages
    #[serde(default = "default_category_dir")]
    pub category_dir: String,
    /// Posts per listing page
    #[serde(default = "default_paginate")]
    pub paginate: usize,
    /// Where entity content lives during a build
    #[serde(default)]
    pub content_cache: ContentCacheMode,
    /// Output paths that cleanup never deletes
    #[serde(default = "default_keep_files")]
    pub keep_files: Vec<String>,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    /// Any other keys, available in templates as `site.<key>`
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: None,
            url: None,
            source: default_source(),
            output: default_output(),
            theme: default_theme(),
            permalink: default_permalink(),
            date_format: default_date_format(),
            tag_title_prefix: String::new(),
            category_title_prefix: String::new(),
            tag_dir: default_tag_dir(),
            category_dir: default_category_dir(),
            paginate: default_paginate(),
            content_cache: ContentCacheMode::default(),
            keep_files: default_keep_files(),
            markdown: MarkdownConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Build the absolute (canonical) URL for a site-relative URL.
    pub fn canonical(&self, url: &str) -> String {
        match &self.url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), url),
            None => url.to_string(),
        }
    }

    /// The strftime pattern for `date_formatted` / `updated_formatted`.
    pub fn date_pattern(&self) -> String {
        crate::build::date::display_pattern(&self.date_format)
    }
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

fn default_theme() -> PathBuf {
    PathBuf::from("themes/default")
}

fn default_permalink() -> String {
    "/:year/:month/:day/:title/".to_string()
}

fn default_date_format() -> String {
    "yyyy-MM-dd".to_string()
}

fn default_tag_dir() -> String {
    "/tag/".to_string()
}

fn default_category_dir() -> String {
    "/category/".to_string()
}

fn default_paginate() -> usize {
    10
}

fn default_keep_files() -> Vec<String> {
    vec![".git".to_string()]
}

// =============================================================================
// Content cache configuration
// =============================================================================

/// Storage used for entity content during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCacheMode {
    /// Content lives in a field on each entity
    #[default]
    Inline,
    /// Content lives in a shared in-memory key-value cache
    Memory,
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: SiteConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.source, PathBuf::from("source"));
        assert_eq!(config.output, PathBuf::from("_site"));
        assert_eq!(config.tag_title_prefix, "");
        assert_eq!(config.date_format, "yyyy-MM-dd");
        assert_eq!(config.paginate, 10);
        assert_eq!(config.content_cache, ContentCacheMode::Inline);
    }

    #[test]
    fn test_unknown_keys_go_to_extra() {
        let config: SiteConfig =
            serde_yaml::from_str("title: Blog\nauthor: Jane\ncontent_cache: memory\n").unwrap();
        assert_eq!(config.title.as_deref(), Some("Blog"));
        assert_eq!(config.content_cache, ContentCacheMode::Memory);
        assert_eq!(config.extra.get("author"), Some(&serde_json::json!("Jane")));
    }

    #[test]
    fn test_canonical() {
        let mut config = SiteConfig::default();
        assert_eq!(config.canonical("/tag/go/"), "/tag/go/");

        config.url = Some("https://example.com/".to_string());
        assert_eq!(config.canonical("/tag/go/"), "https://example.com/tag/go/");
    }
}
