//! Derived page generation stage.

use crate::build::generator::in_order;
use crate::build::pipeline::{BuildError, PipelineContext, Stage};
use crate::build::processor::Processor;
use crate::build::site::Site;

/// Stage that runs the registered generators, lowest order first.
pub struct GenerateStage;

impl Stage for GenerateStage {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        for generator in in_order(ctx.generators) {
            let before = site.pages.len();
            generator.generate(site);
            tracing::debug!(
                generator = generator.name(),
                pages = site.pages.len().saturating_sub(before),
                "generator finished"
            );
        }
        ctx.processors.post_generate(site);
        Ok(())
    }
}
