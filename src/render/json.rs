//! JSON rendering.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Document, DocumentMetadata, Page, Query, Table};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let export = JsonDocument::new(doc);
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&export),
        JsonFormat::Compact => serde_json::to_string(&export),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert a document to a JSON value.
pub fn to_json_value(doc: &Document) -> Result<serde_json::Value> {
    serde_json::to_value(JsonDocument::new(doc))
        .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: &'a DocumentMetadata,
    pages: Vec<JsonPage<'a>>,
}

impl<'a> JsonDocument<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            metadata: doc.metadata(),
            pages: doc.pages().iter().map(JsonPage::new).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonPage<'a> {
    number: u32,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_box: Option<BoundingBox>,
    lines: Vec<JsonLine<'a>>,
    tables: Vec<JsonTable>,
    fields: Vec<JsonField<'a>>,
    selection_elements: Vec<JsonSelection>,
    queries: Vec<JsonQuery<'a>>,
}

impl<'a> JsonPage<'a> {
    fn new(page: &Page<'a>) -> Self {
        let forms = page.forms();
        Self {
            number: page.number(),
            text: page.text().into_owned(),
            content_box: page.content_box(),
            lines: page
                .lines()
                .iter()
                .map(|line| JsonLine {
                    text: line.text(),
                    confidence: line.confidence(),
                    bounding_box: line.bounding_box(),
                })
                .collect(),
            tables: page.tables().iter().map(JsonTable::new).collect(),
            fields: forms
                .iter()
                .flat_map(|form| form.fields())
                .map(|field| JsonField {
                    key: field.key_text(),
                    value: field.value_text(),
                    confidence: field.confidence(),
                    selected: field.selection_element().map(|e| e.is_selected()),
                })
                .collect(),
            selection_elements: forms
                .iter()
                .flat_map(|form| form.selection_elements())
                .map(|element| JsonSelection {
                    selected: element.is_selected(),
                    confidence: element.confidence(),
                    bounding_box: element.bounding_box(),
                })
                .collect(),
            queries: page.queries().iter().map(JsonQuery::new).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    text: &'a str,
    confidence: f64,
    bounding_box: BoundingBox,
}

#[derive(Serialize)]
struct JsonTable {
    rows: usize,
    columns: usize,
    /// `cells[row][column]`, `null` for holes
    cells: Vec<Vec<Option<String>>>,
    merged_cells: Vec<JsonMergedCell>,
}

impl JsonTable {
    fn new(table: &Table<'_>) -> Self {
        let cells = table
            .rows()
            .iter()
            .map(|row| {
                (0..table.column_count())
                    .map(|column| row.cell(column).map(|cell| cell.text().into_owned()))
                    .collect()
            })
            .collect();
        let merged_cells = table
            .merged_cells()
            .iter()
            .map(|merged| JsonMergedCell {
                row: merged.row_index(),
                column: merged.column_index(),
                row_span: merged.row_span(),
                column_span: merged.column_span(),
                text: merged.text().into_owned(),
            })
            .collect();
        Self {
            rows: table.row_count(),
            columns: table.column_count(),
            cells,
            merged_cells,
        }
    }
}

#[derive(Serialize)]
struct JsonMergedCell {
    row: usize,
    column: usize,
    row_span: usize,
    column_span: usize,
    text: String,
}

#[derive(Serialize)]
struct JsonField<'a> {
    key: &'a str,
    value: &'a str,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<bool>,
}

#[derive(Serialize)]
struct JsonSelection {
    selected: bool,
    confidence: f64,
    bounding_box: BoundingBox,
}

#[derive(Serialize)]
struct JsonQuery<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<&'a str>,
    answers: Vec<JsonAnswer>,
}

impl<'a> JsonQuery<'a> {
    fn new(query: &Query<'a>) -> Self {
        Self {
            text: query.text(),
            alias: query.alias(),
            answers: query
                .results()
                .iter()
                .map(|result| JsonAnswer {
                    text: result.text().into_owned(),
                    confidence: result.confidence(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonAnswer {
    text: String,
    confidence: f64,
}
