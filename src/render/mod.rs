//! Rendering module for converting documents to text, Markdown and JSON.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, to_json_value, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions, TableFallback};
pub use text::to_text;
