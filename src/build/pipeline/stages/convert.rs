//! Content conversion stage.
//!
//! Converts every post and page in parallel. A failed conversion leaves the
//! entity's content as it was, marks the entity failed and records an
//! issue; the other entities are unaffected.

use rayon::prelude::*;

use crate::build::entity::Convertible;
use crate::build::format::ConvertError;
use crate::build::pipeline::{BuildError, BuildIssue, PipelineContext, Stage, record_issue};
use crate::build::processor::Processor;
use crate::build::site::Site;

pub struct ConvertStage;

impl Stage for ConvertStage {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        let converters = ctx.converters;
        let Site {
            config,
            posts,
            pages,
            issues,
            ..
        } = site;

        let results: Vec<Result<(), ConvertError>> =
            posts.par_iter_mut().map(|p| p.convert(converters)).collect();
        for (post, result) in posts.iter_mut().zip(results) {
            match result {
                Ok(()) => ctx.processors.post_convert_post(config, post),
                Err(e) => {
                    post.entry.mark_failed();
                    record_issue(issues, BuildIssue::error("convert", &post.entry.url, e.to_string()));
                }
            }
        }

        let results: Vec<Result<(), ConvertError>> =
            pages.par_iter_mut().map(|p| p.convert(converters)).collect();
        for (page, result) in pages.iter_mut().zip(results) {
            match result {
                Ok(()) => ctx.processors.post_convert_page(config, page),
                Err(e) => {
                    page.entry.mark_failed();
                    record_issue(issues, BuildIssue::error("convert", &page.entry.url, e.to_string()));
                }
            }
        }

        tracing::info!(
            posts = posts.len(),
            pages = pages.len(),
            "converted content"
        );
        Ok(())
    }
}
