//! Pipeline hooks.
//!
//! A [`Processor`] is notified at every stage boundary. All hooks default to
//! doing nothing, so an implementation only overrides the ones it cares
//! about. [`ProcessorChain`] fans every hook out to its children in
//! registration order.
//!
//! Site-wide hooks get the whole [`Site`]; per-entity hooks get the config
//! and the entity they concern, and run on the build thread after the
//! stage's parallel work is done.

use crate::build::entity::{Page, Post};
use crate::build::site::Site;
use crate::config::SiteConfig;
use crate::theme::Theme;

pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    fn post_setup(&self, _site: &mut Site) {}

    fn post_read(&self, _site: &mut Site) {}

    fn post_generate(&self, _site: &mut Site) {}

    fn post_convert_post(&self, _config: &SiteConfig, _post: &mut Post) {}

    fn post_convert_page(&self, _config: &SiteConfig, _page: &mut Page) {}

    fn post_render_post(&self, _config: &SiteConfig, _post: &mut Post) {}

    fn post_render_page(&self, _config: &SiteConfig, _page: &mut Page) {}

    fn post_render_all_posts(&self, _site: &mut Site) {}

    fn post_render_all_pages(&self, _site: &mut Site) {}

    fn post_write(&self, _site: &mut Site) {}

    fn post_cleanup(&self, _site: &mut Site) {}

    fn before_build_theme(&self, _theme: &Theme) {}

    fn after_build_theme(&self, _theme: &Theme) {}
}

/// Ordered composite of processors.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P: Processor + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }
}

impl Processor for ProcessorChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn post_setup(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_setup(site);
        }
    }

    fn post_read(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_read(site);
        }
    }

    fn post_generate(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_generate(site);
        }
    }

    fn post_convert_post(&self, config: &SiteConfig, post: &mut Post) {
        for p in &self.processors {
            p.post_convert_post(config, post);
        }
    }

    fn post_convert_page(&self, config: &SiteConfig, page: &mut Page) {
        for p in &self.processors {
            p.post_convert_page(config, page);
        }
    }

    fn post_render_post(&self, config: &SiteConfig, post: &mut Post) {
        for p in &self.processors {
            p.post_render_post(config, post);
        }
    }

    fn post_render_page(&self, config: &SiteConfig, page: &mut Page) {
        for p in &self.processors {
            p.post_render_page(config, page);
        }
    }

    fn post_render_all_posts(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_render_all_posts(site);
        }
    }

    fn post_render_all_pages(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_render_all_pages(site);
        }
    }

    fn post_write(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_write(site);
        }
    }

    fn post_cleanup(&self, site: &mut Site) {
        for p in &self.processors {
            p.post_cleanup(site);
        }
    }

    fn before_build_theme(&self, theme: &Theme) {
        for p in &self.processors {
            p.before_build_theme(theme);
        }
    }

    fn after_build_theme(&self, theme: &Theme) {
        for p in &self.processors {
            p.after_build_theme(theme);
        }
    }
}

/// Logs every hook at debug level.
pub struct TraceProcessor;

impl Processor for TraceProcessor {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn post_setup(&self, site: &mut Site) {
        tracing::debug!(base = %site.base_path.display(), "post_setup");
    }

    fn post_read(&self, site: &mut Site) {
        tracing::debug!(
            posts = site.posts.len(),
            pages = site.pages.len(),
            static_files = site.static_files.len(),
            "post_read"
        );
    }

    fn post_generate(&self, site: &mut Site) {
        tracing::debug!(pages = site.pages.len(), "post_generate");
    }

    fn post_convert_post(&self, _config: &SiteConfig, post: &mut Post) {
        tracing::trace!(url = %post.entry.url, "post_convert_post");
    }

    fn post_convert_page(&self, _config: &SiteConfig, page: &mut Page) {
        tracing::trace!(url = %page.entry.url, "post_convert_page");
    }

    fn post_render_post(&self, _config: &SiteConfig, post: &mut Post) {
        tracing::trace!(url = %post.entry.url, "post_render_post");
    }

    fn post_render_page(&self, _config: &SiteConfig, page: &mut Page) {
        tracing::trace!(url = %page.entry.url, "post_render_page");
    }

    fn post_render_all_posts(&self, site: &mut Site) {
        tracing::debug!(posts = site.posts.len(), "post_render_all_posts");
    }

    fn post_render_all_pages(&self, site: &mut Site) {
        tracing::debug!(pages = site.pages.len(), "post_render_all_pages");
    }

    fn post_write(&self, site: &mut Site) {
        tracing::debug!(written = site.written.len(), "post_write");
    }

    fn post_cleanup(&self, site: &mut Site) {
        tracing::debug!(issues = site.issues.len(), "post_cleanup");
    }

    fn before_build_theme(&self, theme: &Theme) {
        tracing::debug!(theme = %theme.name(), "before_build_theme");
    }

    fn after_build_theme(&self, theme: &Theme) {
        tracing::debug!(theme = %theme.name(), "after_build_theme");
    }
}
