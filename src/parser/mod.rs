//! Block-list ingestion and document building.

pub(crate) mod builder;
mod loader;
mod options;
pub mod raw;

pub use loader::BlockListParser;
pub use options::{ErrorMode, ParseOptions};
pub use raw::RawDocument;
