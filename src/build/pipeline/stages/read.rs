//! Source reading stage.
//!
//! Loads every source under the content root and turns it into a post or a
//! page. Problems with single files are recorded and the file is skipped;
//! only a missing content root stops the build.

use crate::build::entity::{Page, Post, UnparsableDate};
use crate::build::pipeline::{BuildError, BuildIssue, PipelineContext, Stage};
use crate::build::processor::Processor;
use crate::build::site::Site;
use crate::build::source::SourceLoader;

pub struct ReadStage;

impl Stage for ReadStage {
    fn name(&self) -> &'static str {
        "read"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        let root = site.source_dir();
        if !root.is_dir() {
            return Err(BuildError::ContentRootMissing(root));
        }

        let loaded = SourceLoader::new(&root).load()?;
        for error in loaded.errors {
            let subject = error
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            site.record(BuildIssue::error("read", subject, error.to_string()));
        }

        let cache = site.cache();
        for source in loaded.sources {
            let extension = ctx.converters.for_source(&source).output_extension(&source);
            let subject = source.path_string();

            let unparsable = if source.is_post() {
                let (post, unparsable) =
                    Post::from_source(source, extension, &site.config, cache.clone());
                site.posts.push(post);
                unparsable
            } else {
                let (page, unparsable) =
                    Page::from_source(source, extension, &site.config, cache.clone());
                site.pages.push(page);
                unparsable
            };

            for UnparsableDate { key, value } in unparsable {
                site.record(BuildIssue::warning(
                    "read",
                    subject.clone(),
                    format!("unparsable {key} '{value}', treating it as absent"),
                ));
            }
        }
        site.static_files = loaded.static_files;

        site.sort_posts();
        site.collect_taxonomies();

        tracing::info!(
            posts = site.posts.len(),
            pages = site.pages.len(),
            static_files = site.static_files.len(),
            "read sources"
        );
        ctx.processors.post_read(site);
        Ok(())
    }
}
