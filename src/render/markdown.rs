//! Markdown rendering.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::model::{Document, Form, KeyValue, Page, Query, Table};

use super::{RenderOptions, TableFallback};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            self.render_frontmatter(&mut output, doc)?;
        }

        for page in doc.pages() {
            if self.options.page_selection.includes(page.number()) {
                self.render_page(&mut output, &page)?;
            }
        }

        Ok(output.trim().to_string())
    }

    fn render_frontmatter(&self, output: &mut String, doc: &Document) -> Result<()> {
        let metadata = doc.metadata();
        output.push_str("---\n");
        writeln!(output, "pages: {}", metadata.pages).map_err(fmt_error)?;
        if let Some(version) = &metadata.model_version {
            // A JSON string is a valid YAML double-quoted scalar.
            let quoted = serde_json::to_string(version)
                .map_err(|e| Error::Render(format!("Frontmatter encoding error: {}", e)))?;
            writeln!(output, "model_version: {}", quoted).map_err(fmt_error)?;
        }
        output.push_str("---\n\n");
        Ok(())
    }

    fn render_page(&self, output: &mut String, page: &Page<'_>) -> Result<()> {
        writeln!(output, "## Page {}\n", page.number()).map_err(fmt_error)?;

        for line in page.lines() {
            output.push_str(&self.escape(line.text()));
            output.push_str("\n\n");
        }

        if self.options.include_tables {
            for table in page.tables() {
                self.render_table(output, &table);
            }
        }

        if self.options.include_forms {
            for form in page.forms() {
                self.render_form(output, &form);
            }
        }

        if self.options.include_queries {
            self.render_queries(output, &page.queries());
        }

        Ok(())
    }

    fn render_table(&self, output: &mut String, table: &Table<'_>) {
        if table.is_empty() {
            return;
        }

        if table.has_merged_cells() && self.options.table_fallback == TableFallback::Html {
            self.render_table_html(output, table);
        } else {
            self.render_table_markdown(output, table);
        }
    }

    /// First row is the header. Holes render as empty cells.
    fn render_table_markdown(&self, output: &mut String, table: &Table<'_>) {
        let columns = table.column_count();

        for row in table.rows() {
            output.push('|');
            for column in 0..columns {
                let text = row
                    .cell(column)
                    .map(|cell| self.escape(&cell.text().replace('\n', " ")))
                    .unwrap_or_default();
                output.push(' ');
                output.push_str(text.trim());
                output.push_str(" |");
            }
            output.push('\n');

            if row.index() == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(columns));
                output.push('\n');
            }
        }

        output.push('\n');
    }

    fn render_table_html(&self, output: &mut String, table: &Table<'_>) {
        output.push_str("<table>\n");

        for row in table.rows() {
            let tag = if row.index() == 0 { "th" } else { "td" };
            output.push_str("<tr>");
            for cell in row.cells() {
                output.push('<');
                output.push_str(tag);
                if cell.row_span() > 1 {
                    output.push_str(&format!(" rowspan=\"{}\"", cell.row_span()));
                }
                if cell.column_span() > 1 {
                    output.push_str(&format!(" colspan=\"{}\"", cell.column_span()));
                }
                output.push('>');
                output.push_str(&escape_html(&cell.text()));
                output.push_str(&format!("</{}>", tag));
            }
            output.push_str("</tr>\n");
        }

        output.push_str("</table>\n\n");
    }

    fn render_form(&self, output: &mut String, form: &Form<'_>) {
        let fields = form.fields();
        if fields.is_empty() {
            return;
        }

        for field in &fields {
            output.push_str("- **");
            output.push_str(&self.escape(field.key_text()));
            output.push_str("**: ");
            output.push_str(&self.field_value(field));
            output.push('\n');
        }
        output.push('\n');
    }

    fn field_value(&self, field: &KeyValue<'_>) -> String {
        let text = self.escape(field.value_text());
        match field.selection_element() {
            Some(element) => {
                let mark = if element.is_selected() { "[x]" } else { "[ ]" };
                if text.is_empty() {
                    mark.to_string()
                } else {
                    format!("{} {}", mark, text)
                }
            }
            None => text,
        }
    }

    fn render_queries(&self, output: &mut String, queries: &[Query<'_>]) {
        if queries.is_empty() {
            return;
        }

        for query in queries {
            let answer = query
                .top_result()
                .map(|result| self.escape(&result.text()))
                .unwrap_or_default();
            output.push_str("- ");
            output.push_str(&self.escape(query.text()));
            output.push_str(": ");
            output.push_str(&answer);
            output.push('\n');
        }
        output.push('\n');
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

fn fmt_error(e: std::fmt::Error) -> Error {
    Error::Render(format!("Markdown formatting error: {}", e))
}

/// Escape characters that could be read as Markdown syntax inside running
/// text or a table cell.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '|') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockType, DocumentMetadata, EntityType, RelationshipType};
    use crate::parser::ParseOptions;

    fn cell(id: &str, row: u32, column: u32, word: &str) -> Block {
        Block::new(id, BlockType::Cell)
            .with_cell_position(row, column)
            .with_children([word])
    }

    fn word(id: &str, text: &str) -> Block {
        Block::new(id, BlockType::Word).with_text(text)
    }

    fn sample() -> Document {
        Document::from_blocks(
            vec![
                Block::new("p1", BlockType::Page)
                    .with_page(1)
                    .with_children(["l1", "t1"]),
                Block::new("l1", BlockType::Line).with_text("Invoice *draft*"),
                Block::new("t1", BlockType::Table).with_children(["c00", "c01", "c10"]),
                cell("c00", 0, 0, "w1"),
                cell("c01", 0, 1, "w2"),
                cell("c10", 1, 0, "w3"),
                word("w1", "Item"),
                word("w2", "Price"),
                word("w3", "a|b"),
                Block::new("k1", BlockType::KeyValueSet)
                    .with_entity_type(EntityType::Key)
                    .with_page(1)
                    .with_relationship(RelationshipType::Value, ["v1"])
                    .with_children(["w4"]),
                Block::new("v1", BlockType::KeyValueSet)
                    .with_entity_type(EntityType::Value)
                    .with_page(1)
                    .with_children(["s1"]),
                word("w4", "Paid"),
                Block::new("s1", BlockType::SelectionElement).with_selection_status("SELECTED"),
            ],
            DocumentMetadata::default(),
            &ParseOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("3.5 - 1!"), "3.5 - 1!");
    }

    #[test]
    fn test_render_page() {
        let md = to_markdown(&sample(), &RenderOptions::default()).unwrap();
        assert!(md.starts_with("## Page 1"));
        assert!(md.contains("Invoice \\*draft\\*"));
        assert!(md.contains("| Item | Price |\n| --- | --- |\n| a\\|b |  |"));
        assert!(md.contains("- **Paid**: [x]"));
    }

    #[test]
    fn test_render_without_tables_and_forms() {
        let options = RenderOptions::new()
            .with_tables(false)
            .with_forms(false)
            .with_escaping(false);
        let md = to_markdown(&sample(), &options).unwrap();
        assert!(md.contains("Invoice *draft*"));
        assert!(!md.contains("| Item"));
        assert!(!md.contains("**Paid**"));
    }

    #[test]
    fn test_render_merged_table_as_html() {
        let doc = Document::from_blocks(
            vec![
                Block::new("p1", BlockType::Page).with_children(["t1"]),
                Block::new("t1", BlockType::Table).with_children(["c00", "c10", "c11"]),
                cell("c00", 0, 0, "w1").with_span(1, 2),
                cell("c10", 1, 0, "w2"),
                cell("c11", 1, 1, "w3"),
                word("w1", "Total"),
                word("w2", "<a>"),
                word("w3", "b"),
            ],
            DocumentMetadata::default(),
            &ParseOptions::default(),
        )
        .unwrap();
        let options = RenderOptions::new().with_table_fallback(TableFallback::Html);
        let md = to_markdown(&doc, &options).unwrap();
        assert!(md.contains("<tr><th colspan=\"2\">Total</th></tr>"));
        assert!(md.contains("<td>&lt;a&gt;</td>"));
    }

    #[test]
    fn test_render_with_frontmatter() {
        let options = RenderOptions::new().with_frontmatter(true);
        let md = to_markdown(&sample(), &options).unwrap();
        assert!(md.starts_with("---\npages: 1\n---"));
    }

    #[test]
    fn test_frontmatter_escapes_model_version() {
        let metadata = DocumentMetadata {
            pages: 1,
            model_version: Some(r#"2.0 "beta" \ rc"#.to_string()),
        };
        let doc = Document::from_blocks(
            vec![Block::new("p1", BlockType::Page).with_page(1)],
            metadata,
            &ParseOptions::default(),
        )
        .unwrap();
        let options = RenderOptions::new().with_frontmatter(true);
        let md = to_markdown(&doc, &options).unwrap();
        assert!(md.starts_with("---\npages: 1\nmodel_version: \"2.0 \\\"beta\\\" \\\\ rc\"\n---"));
    }
}
