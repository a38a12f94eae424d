//! Plain text rendering.

use crate::error::Result;
use crate::model::Document;

use super::RenderOptions;

/// Convert a document to plain text: selected page texts separated by a
/// blank line.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let output = doc
        .pages()
        .iter()
        .filter(|page| options.page_selection.includes(page.number()))
        .map(|page| page.text())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(output.trim().to_string())
}
