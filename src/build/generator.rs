//! Generators synthesize pages that no source file backs.
//!
//! Generators run once per build, after reading and before conversion,
//! ordered by [`Generator::order`] (lowest first, ties in registration
//! order). The built-ins:
//!
//! | Generator             | Order | Output                         |
//! |-----------------------|-------|--------------------------------|
//! | `PaginationGenerator` | 100   | numbered copies of index pages |
//! | `CategoryGenerator`   | 200   | one page per used category     |
//! | `TagGenerator`        | 300   | one page per used tag          |

mod pagination;
mod taxonomy;

pub use pagination::PaginationGenerator;
pub use taxonomy::{CategoryGenerator, TagGenerator};

use crate::build::site::Site;

pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Position among generators; lower runs first.
    fn order(&self) -> i32;

    /// Append derived pages to the site.
    fn generate(&self, site: &mut Site);
}

/// The built-in generators.
pub fn default_generators() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(PaginationGenerator),
        Box::new(CategoryGenerator),
        Box::new(TagGenerator),
    ]
}

/// Generators sorted by order, stable for equal orders.
pub fn in_order(generators: &[Box<dyn Generator>]) -> Vec<&dyn Generator> {
    let mut ordered: Vec<&dyn Generator> = generators.iter().map(|g| g.as_ref()).collect();
    ordered.sort_by_key(|g| g.order());
    ordered
}
