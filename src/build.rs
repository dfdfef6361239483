mod builder;
pub mod cache;
pub mod date;
pub mod entity;
pub mod format;
pub mod front_matter;
pub mod generator;
mod markdown;
mod paths;
pub mod pipeline;
pub mod processor;
pub mod render;
pub mod site;
pub mod source;
pub mod taxonomy;

pub use builder::Builder;
pub use paths::base_path_from_config;
