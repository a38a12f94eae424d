//! # layoutdoc
//!
//! Document model builder for layout-analysis output.
//!
//! OCR and layout-analysis services describe a document as a flat list of
//! typed blocks (pages, lines, words, tables, cells, key/value sets, ...)
//! that refer to each other by identifier. This library turns such a block
//! list into a navigable, immutable document model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use layoutdoc::{parse_file, render};
//!
//! fn main() -> layoutdoc::Result<()> {
//!     let doc = parse_file("analysis.json")?;
//!
//!     for page in doc.pages() {
//!         for table in page.tables() {
//!             println!("{} x {} table", table.row_count(), table.column_count());
//!         }
//!     }
//!
//!     for field in doc.find_key_value_pairs("Name") {
//!         println!("{} = {}", field.key_text(), field.value_text());
//!     }
//!
//!     let markdown = render::to_markdown(&doc, &render::RenderOptions::default())?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two-pass build**: blocks are indexed by id, then edges are resolved
//! - **Tables**: dense cell grid with holes, merged cells, header cells
//! - **Forms**: key/value pairs with exact and case-insensitive key search
//! - **Queries**: questions and their best-scoring answers
//! - **Flexible input**: one document object or an array of them

pub mod error;
pub mod model;
pub mod parser;
pub mod render;

pub use error::{Error, ErrorKind, Result};
pub use model::{
    Block, BlockRef, BlockType, BoundingBox, Cell, Document, DocumentMetadata, EntityType,
    FilterOptions, Form, Geometry, KeyValue, Line, MergedCell, Page, Point, Query, QueryInfo,
    QueryResult, Relationship, RelationshipType, SelectionElement, SelectionStatus, Table,
    TableRow, TextType,
};
pub use parser::{BlockListParser, ErrorMode, ParseOptions};
pub use render::{JsonFormat, PageSelection, RenderOptions, TableFallback};

use std::io::{Read, Seek};
use std::path::Path;

/// Parse a block-list JSON file and return its first document.
///
/// # Example
///
/// ```no_run
/// use layoutdoc::parse_file;
///
/// let doc = parse_file("analysis.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    BlockListParser::open(path)?.parse()
}

/// Parse a block-list JSON file with custom options.
///
/// # Example
///
/// ```no_run
/// use layoutdoc::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new()
///     .lenient()
///     .with_confidence_threshold(50.0);
/// let doc = parse_file_with_options("analysis.json", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    BlockListParser::open_with_options(path, options)?.parse()
}

/// Load every document of a block-list JSON file.
///
/// The file may hold one document object or an array of them.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    BlockListParser::open(path)?.parse_all()
}

/// Load every document of a block-list JSON file with custom options.
pub fn load_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<Vec<Document>> {
    BlockListParser::open_with_options(path, options)?.parse_all()
}

/// Load every document from a seekable reader.
///
/// `input` names the stream in error messages.
///
/// # Example
///
/// ```no_run
/// use layoutdoc::{load_reader, ParseOptions};
/// use std::fs::File;
///
/// let file = File::open("batch.json").unwrap();
/// let docs = load_reader(file, "batch.json", ParseOptions::default()).unwrap();
/// ```
pub fn load_reader<R: Read + Seek>(
    reader: R,
    input: impl Into<String>,
    options: ParseOptions,
) -> Result<Vec<Document>> {
    BlockListParser::from_reader_with_options(reader, input, options)?.parse_all()
}

/// Parse the first document from a seekable reader.
pub fn parse_reader<R: Read + Seek>(reader: R, input: impl Into<String>) -> Result<Document> {
    BlockListParser::from_reader(reader, input)?.parse()
}

/// Parse the first document from a JSON string.
///
/// # Example
///
/// ```
/// let json = r#"{"Blocks": [
///     {"Id": "p1", "BlockType": "PAGE", "Relationships": [{"Type": "CHILD", "Ids": ["l1"]}]},
///     {"Id": "l1", "BlockType": "LINE", "Text": "Hello World"}
/// ]}"#;
/// let doc = layoutdoc::parse_str(json)?;
/// assert_eq!(doc.text(), "Hello World");
/// # Ok::<(), layoutdoc::Error>(())
/// ```
pub fn parse_str(json: &str) -> Result<Document> {
    BlockListParser::from_bytes(json.as_bytes())?.parse()
}

/// Load every document from a JSON string.
pub fn load_str(json: &str) -> Result<Vec<Document>> {
    BlockListParser::from_bytes(json.as_bytes())?.parse_all()
}

/// Parse the first document from JSON bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    BlockListParser::from_bytes(data)?.parse()
}

/// Load every document from JSON bytes.
pub fn load_slice(data: &[u8]) -> Result<Vec<Document>> {
    BlockListParser::from_bytes(data)?.parse_all()
}

/// Extract plain text from a block-list JSON file.
///
/// # Example
///
/// ```no_run
/// let text = layoutdoc::extract_text("analysis.json").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    Ok(doc.text())
}

/// Convert a block-list JSON file to Markdown.
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Convert a block-list JSON file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_text(&doc, options)
}

/// Convert a block-list JSON file to the JSON export format.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for parsing and rendering documents.
///
/// # Example
///
/// ```no_run
/// use layoutdoc::Layoutdoc;
///
/// let markdown = Layoutdoc::new()
///     .lenient()
///     .with_confidence_threshold(80.0)
///     .without_queries()
///     .parse("analysis.json")?
///     .to_markdown()?;
/// # Ok::<(), layoutdoc::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Layoutdoc {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Layoutdoc {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Drop lines, words and fields below a confidence.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.parse_options = self.parse_options.with_confidence_threshold(threshold);
        self
    }

    /// Keep lines in relationship order.
    pub fn relationship_order(mut self) -> Self {
        self.parse_options = self.parse_options.relationship_order();
        self
    }

    /// Enable frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Set table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.render_options = self.render_options.with_table_fallback(fallback);
        self
    }

    /// Leave query answers out of rendered output.
    pub fn without_queries(mut self) -> Self {
        self.render_options = self.render_options.with_queries(false);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Parse the first document of a file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<LayoutdocResult> {
        let document = BlockListParser::open_with_options(path, self.parse_options)?.parse()?;
        Ok(LayoutdocResult {
            document,
            render_options: self.render_options,
        })
    }

    /// Parse the first document of a JSON string.
    pub fn parse_str(self, json: &str) -> Result<LayoutdocResult> {
        let document =
            BlockListParser::from_bytes_with_options(json.as_bytes(), self.parse_options)?
                .parse()?;
        Ok(LayoutdocResult {
            document,
            render_options: self.render_options,
        })
    }
}

/// A parsed document together with the render options chosen on the builder.
#[derive(Debug)]
pub struct LayoutdocResult {
    /// The parsed document
    pub document: Document,
    render_options: RenderOptions,
}

impl LayoutdocResult {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "DocumentMetadata": {"Pages": 1},
        "Blocks": [
            {"Id": "p1", "BlockType": "PAGE", "Page": 1,
             "Relationships": [{"Type": "CHILD", "Ids": ["l1"]}]},
            {"Id": "l1", "BlockType": "LINE", "Text": "Hello World", "Page": 1,
             "Confidence": 40.0}
        ]
    }"#;

    #[test]
    fn test_layoutdoc_builder() {
        let builder = Layoutdoc::new()
            .lenient()
            .with_frontmatter()
            .with_confidence_threshold(50.0);

        assert_eq!(builder.parse_options.error_mode, ErrorMode::Lenient);
        assert_eq!(builder.parse_options.confidence_threshold, 50.0);
        assert!(builder.render_options.include_frontmatter);
    }

    #[test]
    fn test_layoutdoc_builder_with_pages() {
        let builder = Layoutdoc::new().with_pages(PageSelection::Range(1..=5));
        assert_eq!(
            builder.render_options.page_selection,
            PageSelection::Range(1..=5)
        );
    }

    #[test]
    fn test_layoutdoc_parse_str() {
        let result = Layoutdoc::new().parse_str(DOC).unwrap();
        assert_eq!(result.to_text().unwrap(), "Hello World");
        assert!(result.to_markdown().unwrap().contains("## Page 1"));

        let filtered = Layoutdoc::new()
            .with_confidence_threshold(50.0)
            .parse_str(DOC)
            .unwrap();
        assert!(filtered.document().pages()[0].lines().is_empty());
    }

    #[test]
    fn test_parse_str_and_load_str() {
        assert_eq!(parse_str(DOC).unwrap().page_count(), 1);
        let batch = format!("[{}, {}, {}]", DOC, DOC, DOC);
        assert_eq!(load_str(&batch).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_bytes_empty_data() {
        let err = parse_bytes(b"").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_parse_bytes_not_json() {
        assert!(parse_bytes(b"<html></html>").is_err());
    }
}
