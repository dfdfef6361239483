//! Default pipeline stages.
//!
//! The standard pipeline consists of:
//!
//! 1. **ReadStage** - Load sources and build posts and pages
//! 2. **GenerateStage** - Run generators for derived pages
//! 3. **ConvertStage** - Convert content through the matching converter
//! 4. **RenderStage** - Render content through templates
//! 5. **WriteStage** - Write output and copy static files
//! 6. **CleanupStage** - Remove stale files from the output directory

mod cleanup;
mod convert;
mod generate;
mod read;
mod render;
mod write;

pub use cleanup::CleanupStage;
pub use convert::ConvertStage;
pub use generate::GenerateStage;
pub use read::ReadStage;
pub use render::RenderStage;
pub use write::WriteStage;
