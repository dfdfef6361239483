//! Pipeline context for sharing services across stages.

use crate::build::format::ConverterRegistry;
use crate::build::generator::Generator;
use crate::build::processor::ProcessorChain;
use crate::build::render::Renderer;

/// Services the stages need besides the site itself.
///
/// Everything here is read-only for the duration of a build.
pub struct PipelineContext<'a> {
    /// Converter lookup for sources
    pub converters: &'a ConverterRegistry,

    /// Registered generators, in registration order
    pub generators: &'a [Box<dyn Generator>],

    /// Hooks notified at each stage boundary
    pub processors: &'a ProcessorChain,

    /// Template renderer
    pub renderer: &'a dyn Renderer,
}
