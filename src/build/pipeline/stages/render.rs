//! Template rendering stage.
//!
//! Posts render first, then pages, each set in parallel. Listing pages see
//! post data as it stood after conversion. A failed render is recorded and
//! the entity is skipped by the write stage.

use rayon::prelude::*;
use serde_json::Value;

use crate::build::entity::Renderable;
use crate::build::pipeline::{BuildError, BuildIssue, PipelineContext, Stage, record_issue};
use crate::build::processor::Processor;
use crate::build::render::{RenderContext, RenderError};
use crate::build::site::Site;

pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        let site_value = site.template_data();
        let post_values: Vec<Value> = site
            .posts
            .iter()
            .map(|p| p.to_json(&site.config, &site.tags, &site.categories))
            .collect();
        let renderer = ctx.renderer;

        {
            let Site {
                config,
                posts,
                tags,
                categories,
                issues,
                ..
            } = &mut *site;
            let render_ctx = RenderContext {
                config,
                site: &site_value,
                posts: &post_values,
                tags,
                categories,
            };

            let results: Vec<Option<Result<(), RenderError>>> = posts
                .par_iter_mut()
                .map(|p| (!p.entry.is_failed()).then(|| p.render(renderer, &render_ctx)))
                .collect();
            for (post, result) in posts.iter_mut().zip(results) {
                match result {
                    Some(Ok(())) => ctx.processors.post_render_post(config, post),
                    Some(Err(e)) => {
                        post.entry.mark_failed();
                        record_issue(issues, BuildIssue::error("render", &post.entry.url, e.to_string()));
                    }
                    None => {}
                }
            }
        }
        ctx.processors.post_render_all_posts(site);

        {
            let Site {
                config,
                pages,
                tags,
                categories,
                issues,
                ..
            } = &mut *site;
            let render_ctx = RenderContext {
                config,
                site: &site_value,
                posts: &post_values,
                tags,
                categories,
            };

            let results: Vec<Option<Result<(), RenderError>>> = pages
                .par_iter_mut()
                .map(|p| (!p.entry.is_failed()).then(|| p.render(renderer, &render_ctx)))
                .collect();
            for (page, result) in pages.iter_mut().zip(results) {
                match result {
                    Some(Ok(())) => ctx.processors.post_render_page(config, page),
                    Some(Err(e)) => {
                        page.entry.mark_failed();
                        record_issue(issues, BuildIssue::error("render", &page.entry.url, e.to_string()));
                    }
                    None => {}
                }
            }
        }
        ctx.processors.post_render_all_pages(site);

        tracing::info!(
            posts = site.posts.len(),
            pages = site.pages.len(),
            "rendered content"
        );
        Ok(())
    }
}
