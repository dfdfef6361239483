//! Template rendering.
//!
//! Entities render through the [`Renderer`] trait: a template name plus a
//! root data map in, a string out. [`TeraRenderer`] is the default
//! implementation, loading templates from the theme directory.

use std::path::Path;

use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::build::taxonomy::Taxon;
use crate::config::SiteConfig;

/// Root data map handed to templates.
pub type RootMap = Map<String, Value>;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to render template '{template}': {message}")]
    Template { template: String, message: String },

    #[error("templates directory not found: {0}")]
    TemplatesMissing(String),

    #[error("failed to load templates: {0}")]
    Load(String),
}

impl RenderError {
    /// Wrap an engine error, keeping its whole cause chain (which carries
    /// the template line information).
    pub fn template(template: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Template {
            template: template.into(),
            message: error_chain(err),
        }
    }
}

/// Renders a named template against a root data map.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, root: &RootMap) -> Result<String, RenderError>;
}

/// The template renderer, wrapping Tera.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Create a renderer loading `**/*.html` templates from a directory.
    pub fn new(templates_path: &Path) -> Result<Self, RenderError> {
        if !templates_path.is_dir() {
            return Err(RenderError::TemplatesMissing(
                templates_path.display().to_string(),
            ));
        }

        let glob = templates_path.join("**/*.html");
        let glob_str = glob.to_string_lossy();
        let tera = Tera::new(&glob_str).map_err(|e| RenderError::Load(error_chain(&e)))?;

        tracing::debug!(
            templates = tera.get_template_names().count(),
            path = %templates_path.display(),
            "loaded templates"
        );
        Ok(Self { tera })
    }

    /// Wrap an already configured Tera instance.
    pub fn from_tera(tera: Tera) -> Self {
        Self { tera }
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, root: &RootMap) -> Result<String, RenderError> {
        if !self.tera.get_template_names().any(|name| name == template) {
            return Err(RenderError::TemplateNotFound(template.to_string()));
        }

        let context =
            Context::from_serialize(root).map_err(|e| RenderError::template(template, &e))?;
        self.tera
            .render(template, &context)
            .map_err(|e| RenderError::template(template, &e))
    }
}

/// Read-only data shared by every render in a build.
pub struct RenderContext<'a> {
    pub config: &'a SiteConfig,
    /// The `site` value exposed to templates
    pub site: &'a Value,
    /// Template data for each post, indexed like the site's posts
    pub posts: &'a [Value],
    pub tags: &'a [Taxon],
    pub categories: &'a [Taxon],
}

impl RenderContext<'_> {
    /// A fresh root map holding the site-wide values.
    pub fn root_map(&self) -> RootMap {
        let mut root = RootMap::new();
        root.insert("site".to_string(), self.site.clone());
        root
    }

    /// Template data for the posts at the given indices.
    pub fn posts_at(&self, indices: &[usize]) -> Value {
        Value::Array(
            indices
                .iter()
                .filter_map(|&i| self.posts.get(i).cloned())
                .collect(),
        )
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
