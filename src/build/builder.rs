use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::theme::Theme;

use super::cache::ContentCache;
use super::format::{Converter, ConverterRegistry};
use super::generator::{Generator, default_generators};
use super::pipeline::{BuildError, BuildIssue, Pipeline, PipelineContext};
use super::processor::{Processor, ProcessorChain, TraceProcessor};
use super::render::{Renderer, TeraRenderer};
use super::site::Site;

/// Outcome of a build that ran to completion.
#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub posts: usize,
    pub pages: usize,
    /// Files written, including copied static files
    pub written: usize,
    /// Per-entity problems, in the order they were found
    pub issues: Vec<BuildIssue>,
}

impl BuildReport {
    fn from_site(site: Site) -> Self {
        Self {
            output_dir: site.output_dir(),
            posts: site.posts.len(),
            pages: site.pages.len(),
            written: site.written.len(),
            issues: site.issues,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(BuildIssue::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }
}

/// Configures and runs a build.
///
/// ```ignore
/// let report = Builder::new(config, base_path)
///     .with_processor(SitemapProcessor)
///     .build()?;
/// ```
pub struct Builder {
    config: SiteConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    converters: ConverterRegistry,
    generators: Vec<Box<dyn Generator>>,
    processors: ProcessorChain,
    pipeline: Pipeline,
    /// Replaces the theme's template renderer when set
    renderer: Option<Box<dyn Renderer>>,
    cache: Option<Arc<dyn ContentCache>>,
}

impl Builder {
    pub fn new(config: SiteConfig, base_path: PathBuf) -> Self {
        let converters = ConverterRegistry::with_defaults(&config.markdown);
        let mut processors = ProcessorChain::new();
        processors.push(TraceProcessor);

        Self {
            config,
            base_path,
            converters,
            generators: default_generators(),
            processors,
            pipeline: Pipeline::default_pipeline(),
            renderer: None,
            cache: None,
        }
    }

    /// Register a converter after the built-in ones.
    pub fn with_converter<C: Converter + 'static>(mut self, converter: C) -> Self {
        self.converters.register(converter);
        self
    }

    /// Replace the converter registry.
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_generator<G: Generator + 'static>(mut self, generator: G) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn with_processor<P: Processor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(processor);
        self
    }

    /// Render with this renderer instead of loading the theme.
    pub fn with_renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Keep entity content in an external cache.
    pub fn with_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let mut site = Site::new(self.config.clone(), self.base_path.clone());
        if let Some(cache) = &self.cache {
            site.set_cache(cache.clone());
        }
        self.processors.post_setup(&mut site);

        let theme_renderer;
        let renderer: &dyn Renderer = match &self.renderer {
            Some(renderer) => renderer.as_ref(),
            None => {
                theme_renderer = self.load_theme(&site)?;
                &theme_renderer
            }
        };

        let ctx = PipelineContext {
            converters: &self.converters,
            generators: &self.generators,
            processors: &self.processors,
            renderer,
        };
        self.pipeline.run(&mut site, &ctx)?;

        let report = BuildReport::from_site(site);
        tracing::info!(
            posts = report.posts,
            pages = report.pages,
            written = report.written,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "build finished"
        );
        Ok(report)
    }

    fn load_theme(&self, site: &Site) -> Result<TeraRenderer, BuildError> {
        let theme = Theme::load(&site.theme_dir())?;
        self.processors.before_build_theme(&theme);
        let renderer = TeraRenderer::new(&theme.templates_dir())?;
        self.processors.after_build_theme(&theme);
        tracing::debug!(theme = %theme.name(), "loaded theme");
        Ok(renderer)
    }
}
