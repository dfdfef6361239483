//! Pluggable content converters.
//!
//! A converter turns a source's raw body into output markup (Markdown into
//! HTML, for example). The registry picks the first registered converter
//! that accepts a source; sources nobody accepts pass through unchanged.
//!
//! # Adding a Converter
//!
//! ```ignore
//! struct TextileConverter;
//!
//! impl Converter for TextileConverter {
//!     fn name(&self) -> &'static str { "textile" }
//!     fn can_convert(&self, source: &Source) -> bool { source.kind == "textile" }
//!     fn output_extension(&self, _source: &Source) -> String { ".html".into() }
//!     fn convert(&self, content: &str) -> Result<String, ConvertError> { ... }
//! }
//!
//! registry.register(TextileConverter);
//! ```

use pulldown_cmark::Options;

use crate::build::markdown::{MarkdownError, markdown_options, render_markdown};
use crate::build::source::Source;
use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// Generic conversion error for custom converters.
    #[error("{converter} failed: {message}")]
    Failed {
        converter: &'static str,
        message: String,
    },

    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),
}

/// Something that can convert the body of certain sources.
pub trait Converter: Send + Sync {
    /// The name of this converter (e.g., "markdown").
    fn name(&self) -> &'static str;

    /// Whether this converter handles the given source.
    fn can_convert(&self, source: &Source) -> bool;

    /// Extension of the converted output, with the dot (e.g. ".html").
    fn output_extension(&self, source: &Source) -> String;

    /// Convert raw content into output markup.
    fn convert(&self, content: &str) -> Result<String, ConvertError>;
}

/// Markdown converter backed by pulldown-cmark.
pub struct MarkdownConverter {
    options: Result<Options, String>,
}

impl MarkdownConverter {
    /// Create a converter from markdown settings.
    ///
    /// An unknown extension name does not fail here; every conversion
    /// reports it instead, so the problem surfaces per entity.
    pub fn new(markdown_config: &MarkdownConfig) -> Self {
        Self {
            options: markdown_options(markdown_config).map_err(|e| match e {
                MarkdownError::InvalidExtension(name) => name,
            }),
        }
    }
}

impl Converter for MarkdownConverter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn can_convert(&self, source: &Source) -> bool {
        matches!(source.kind.as_str(), "md" | "markdown" | "mkd" | "mkdn")
    }

    fn output_extension(&self, _source: &Source) -> String {
        ".html".to_string()
    }

    fn convert(&self, content: &str) -> Result<String, ConvertError> {
        match &self.options {
            Ok(options) => Ok(render_markdown(content, *options)),
            Err(name) => Err(MarkdownError::InvalidExtension(name.clone()).into()),
        }
    }
}

/// Pass-through converter used when nothing else matches.
pub struct IdentityConverter;

impl Converter for IdentityConverter {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn can_convert(&self, _source: &Source) -> bool {
        true
    }

    fn output_extension(&self, source: &Source) -> String {
        if source.kind.is_empty() {
            String::new()
        } else {
            format!(".{}", source.kind)
        }
    }

    fn convert(&self, content: &str) -> Result<String, ConvertError> {
        Ok(content.to_string())
    }
}

static IDENTITY: IdentityConverter = IdentityConverter;

/// Registry of converters, searched in registration order.
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Create a registry with the default converters (Markdown).
    pub fn with_defaults(markdown_config: &MarkdownConfig) -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownConverter::new(markdown_config));
        registry
    }

    /// Register a converter after the existing ones.
    pub fn register<C: Converter + 'static>(&mut self, converter: C) {
        self.converters.push(Box::new(converter));
    }

    /// The first converter accepting this source, or the identity converter.
    pub fn for_source(&self, source: &Source) -> &dyn Converter {
        self.converters
            .iter()
            .find(|c| c.can_convert(source))
            .map(|c| c.as_ref())
            .unwrap_or(&IDENTITY)
    }

    /// Names of the registered converters, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults(&MarkdownConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::front_matter::FrontMatter;

    fn source(path: &str, body: &str) -> Source {
        Source::new(path, FrontMatter::new(), body)
    }

    struct ShoutConverter;
    impl Converter for ShoutConverter {
        fn name(&self) -> &'static str {
            "shout"
        }
        fn can_convert(&self, source: &Source) -> bool {
            source.kind == "md"
        }
        fn output_extension(&self, _source: &Source) -> String {
            ".txt".to_string()
        }
        fn convert(&self, content: &str) -> Result<String, ConvertError> {
            Ok(content.to_uppercase())
        }
    }

    fn convert(registry: &ConverterRegistry, source: &Source) -> (String, String) {
        let converter = registry.for_source(source);
        (
            converter.output_extension(source),
            converter.convert(&source.body).unwrap(),
        )
    }

    #[test]
    fn test_markdown_converter() {
        let registry = ConverterRegistry::default();
        let (ext, html) = convert(&registry, &source("post.md", "*hi*"));
        assert_eq!(ext, ".html");
        assert_eq!(html.trim(), "<p><em>hi</em></p>");
    }

    #[test]
    fn test_unmatched_source_passes_through() {
        let registry = ConverterRegistry::default();
        let (ext, content) = convert(&registry, &source("page.html", "<b>raw</b>"));
        assert_eq!(ext, ".html");
        assert_eq!(content, "<b>raw</b>");
        assert_eq!(registry.for_source(&source("x.html", "")).name(), "identity");
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register(ShoutConverter);
        registry.register(MarkdownConverter::new(&MarkdownConfig::default()));

        let (ext, content) = convert(&registry, &source("post.md", "hey"));
        assert_eq!(ext, ".txt");
        assert_eq!(content, "HEY");
        assert_eq!(registry.names(), vec!["shout", "markdown"]);
    }

    #[test]
    fn test_bad_markdown_extension_fails_conversion() {
        let config = MarkdownConfig {
            extensions: vec!["bogus".to_string()],
        };
        let converter = MarkdownConverter::new(&config);
        assert!(matches!(
            converter.convert("# hi"),
            Err(ConvertError::Markdown(MarkdownError::InvalidExtension(_)))
        ));
    }
}
