//! Build pipeline.
//!
//! The pipeline moves the site through a series of stages:
//! 1. Read (sources into posts and pages)
//! 2. Generate (derived pages)
//! 3. Convert (Markdown to HTML and friends)
//! 4. Render (templates)
//! 5. Write (output files)
//! 6. Cleanup (stale output)
//!
//! Each stage finishes for every entity before the next one starts. Inside
//! a stage, per-entity work may run in parallel.
//!
//! Custom stages can be inserted before or after any named stage.

mod context;
mod error;
mod stages;

pub use context::PipelineContext;
pub use error::{BuildError, BuildIssue, Severity, record_issue};

use stages::{CleanupStage, ConvertStage, GenerateStage, ReadStage, RenderStage, WriteStage};

use crate::build::site::Site;

/// A stage in the build pipeline.
///
/// A stage gets exclusive access to the site and returns an error only for
/// problems that must stop the build; anything confined to one entity is
/// recorded on the site instead.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError>;
}

/// The build pipeline.
///
/// The default pipeline includes: read → generate → convert → render →
/// write → cleanup.
///
/// # Extension Points
///
/// Insert custom stages using `insert_before` or `insert_after`:
///
/// ```ignore
/// pipeline.insert_after("render", MinifyStage);
/// ```
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(ReadStage);
        pipeline.add_stage(GenerateStage);
        pipeline.add_stage(ConvertStage);
        pipeline.add_stage(RenderStage);
        pipeline.add_stage(WriteStage);
        pipeline.add_stage(CleanupStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    ///
    /// # Panics
    ///
    /// Panics if no stage with the given name exists.
    pub fn insert_before<S: Stage + 'static>(&mut self, name: &str, stage: S) -> &mut Self {
        let pos = self.position(name);
        self.stages.insert(pos, Box::new(stage));
        self
    }

    /// Insert a stage after the named stage.
    ///
    /// # Panics
    ///
    /// Panics if no stage with the given name exists.
    pub fn insert_after<S: Stage + 'static>(&mut self, name: &str, stage: S) -> &mut Self {
        let pos = self.position(name);
        self.stages.insert(pos + 1, Box::new(stage));
        self
    }

    fn position(&self, name: &str) -> usize {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .unwrap_or_else(|| panic!("stage '{}' not found in pipeline", name))
    }

    /// Run every stage in order, stopping at the first fatal error.
    pub fn run(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), "running stage");
            stage.process(site, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
