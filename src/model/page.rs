//! Page-level types.

use std::borrow::Cow;
use std::collections::HashSet;

use super::form::FormData;
use super::query::QueryData;
use super::table::TableData;
use super::{
    BlockRef, BlockType, BoundingBox, Document, Form, Point, Query, RelationshipType, Table,
};
use crate::error::{Error, Result};
use crate::parser::ParseOptions;

/// Lines whose tops differ by less than this share a reading-order band.
const SAME_LINE_THRESHOLD: f64 = 0.02;

#[derive(Debug)]
pub(crate) struct PageData {
    pub(crate) number: u32,
    pub(crate) block: usize,
    pub(crate) lines: Vec<LineData>,
    pub(crate) tables: Vec<TableData>,
    pub(crate) forms: Vec<FormData>,
    pub(crate) words: Vec<usize>,
    pub(crate) queries: Vec<QueryData>,
    pub(crate) signatures: Vec<usize>,
}

impl PageData {
    /// Assemble a page from its PAGE block.
    pub(crate) fn build(block: BlockRef<'_>, number: u32, options: &ParseOptions) -> Result<Self> {
        expect_type(&block, BlockType::Page)?;

        let mut lines = Vec::new();
        let mut tables = Vec::new();
        let mut words = Vec::new();
        let mut seen_words = HashSet::new();
        let threshold = options.confidence_threshold;

        for child in block.children() {
            match child.block_type {
                BlockType::Line => {
                    if child.confidence < threshold {
                        continue;
                    }
                    let line = LineData::new(child)?;
                    for &word in &line.words {
                        let confident = block.document().arena()[word].confidence >= threshold;
                        if confident && seen_words.insert(word) {
                            words.push(word);
                        }
                    }
                    lines.push(line);
                }
                BlockType::Table => tables.push(TableData::build(child, options)?),
                BlockType::Word => {
                    if child.confidence >= threshold && seen_words.insert(child.index()) {
                        words.push(child.index());
                    }
                }
                _ => {}
            }
        }

        let members = page_members(block);
        let forms: Vec<FormData> = FormData::build(block.document(), &members, options)?
            .into_iter()
            .collect();

        let mut queries = Vec::new();
        let mut signatures = Vec::new();
        for &member in &members {
            let member = BlockRef::new(block.document(), member);
            match member.block_type {
                BlockType::Query => queries.push(QueryData::new(member)?),
                BlockType::Signature => signatures.push(member.index()),
                _ => {}
            }
        }

        if options.reading_order {
            let doc = block.document();
            sort_lines(doc, &mut lines);
            tables.sort_by(|a, b| {
                let top_a = doc.arena()[a.block].bounding_box().top;
                let top_b = doc.arena()[b.block].bounding_box().top;
                top_a.total_cmp(&top_b)
            });
        }

        log::debug!(
            "Assembled page {} ({} lines, {} tables, {} words)",
            number,
            lines.len(),
            tables.len(),
            words.len()
        );

        Ok(Self {
            number,
            block: block.index(),
            lines,
            tables,
            forms,
            words,
            queries,
            signatures,
        })
    }
}

/// Every block belonging to a page: blocks reachable from the PAGE block
/// through CHILD, VALUE and ANSWER edges (pre-order), then, when the PAGE block
/// declares its number, blocks declaring the same number that the walk missed
/// (input order).
fn page_members(page: BlockRef<'_>) -> Vec<usize> {
    let doc = page.document();
    let mut visited = HashSet::from([page.index()]);
    let mut members = Vec::new();
    let mut stack: Vec<usize> = page.children().iter().rev().map(|b| b.index()).collect();

    while let Some(index) = stack.pop() {
        let block = BlockRef::new(doc, index);
        if block.block_type == BlockType::Page || !visited.insert(index) {
            continue;
        }
        members.push(index);

        let next: Vec<usize> = block
            .children()
            .into_iter()
            .chain(block.related(&RelationshipType::Value))
            .chain(block.related(&RelationshipType::Answer))
            .map(|b| b.index())
            .collect();
        stack.extend(next.into_iter().rev());
    }

    if page.page == 0 {
        return members;
    }
    for block in doc.blocks() {
        if block.page == page.page
            && block.block_type != BlockType::Page
            && visited.insert(block.index())
        {
            members.push(block.index());
        }
    }

    members
}

/// Stable top-to-bottom order, then left-to-right within a band of lines
/// whose tops lie within [`SAME_LINE_THRESHOLD`] of the band's first line.
fn sort_lines(doc: &Document, lines: &mut Vec<LineData>) {
    let boxes = |line: &LineData| doc.arena()[line.block].bounding_box();

    lines.sort_by(|a, b| boxes(a).top.total_cmp(&boxes(b).top));

    let mut banded: Vec<(usize, f64, LineData)> = Vec::with_capacity(lines.len());
    let mut band = 0;
    let mut band_top = None;
    for line in lines.drain(..) {
        let bbox = boxes(&line);
        match band_top {
            Some(top) if bbox.top - top < SAME_LINE_THRESHOLD => {}
            Some(_) => {
                band += 1;
                band_top = Some(bbox.top);
            }
            None => band_top = Some(bbox.top),
        }
        banded.push((band, bbox.left, line));
    }

    banded.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    lines.extend(banded.into_iter().map(|(_, _, line)| line));
}

pub(crate) fn expect_type(block: &BlockRef<'_>, expected: BlockType) -> Result<()> {
    if block.block_type == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedBlockType {
            id: block.id.clone(),
            expected,
            found: block.block_type,
        })
    }
}

#[derive(Debug)]
pub(crate) struct LineData {
    pub(crate) block: usize,
    pub(crate) words: Vec<usize>,
}

impl LineData {
    pub(crate) fn new(block: BlockRef<'_>) -> Result<Self> {
        expect_type(&block, BlockType::Line)?;
        Ok(Self {
            block: block.index(),
            words: block
                .children_of_type(BlockType::Word)
                .iter()
                .map(|w| w.index())
                .collect(),
        })
    }
}

/// A single page in the document.
#[derive(Clone, Copy)]
pub struct Page<'a> {
    doc: &'a Document,
    data: &'a PageData,
}

impl<'a> Page<'a> {
    pub(crate) fn new(doc: &'a Document, data: &'a PageData) -> Self {
        Self { doc, data }
    }

    /// Page number (1-indexed).
    pub fn number(&self) -> u32 {
        self.data.number
    }

    /// Owning document.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Backing PAGE block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.doc, self.data.block)
    }

    /// Lines on the page.
    pub fn lines(&self) -> Vec<Line<'a>> {
        self.data
            .lines
            .iter()
            .map(|data| Line { page: *self, data })
            .collect()
    }

    /// Tables on the page.
    pub fn tables(&self) -> Vec<Table<'a>> {
        self.data
            .tables
            .iter()
            .map(|data| Table::new(*self, data))
            .collect()
    }

    /// Forms on the page (at most one).
    pub fn forms(&self) -> Vec<Form<'a>> {
        self.data
            .forms
            .iter()
            .map(|data| Form::new(*self, data))
            .collect()
    }

    /// All words on the page, in line order.
    pub fn words(&self) -> Vec<BlockRef<'a>> {
        self.data
            .words
            .iter()
            .map(|&i| BlockRef::new(self.doc, i))
            .collect()
    }

    /// Queries asked about the page.
    pub fn queries(&self) -> Vec<Query<'a>> {
        self.data
            .queries
            .iter()
            .map(|data| Query::new(*self, data))
            .collect()
    }

    /// Signatures detected on the page.
    pub fn signatures(&self) -> Vec<BlockRef<'a>> {
        self.data
            .signatures
            .iter()
            .map(|&i| BlockRef::new(self.doc, i))
            .collect()
    }

    /// Page text: child line texts joined by newlines.
    pub fn text(&self) -> Cow<'a, str> {
        self.block().text()
    }

    /// Bounding box of the page.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().block().bounding_box()
    }

    /// Smallest box covering every line and table on the page, or `None` for
    /// a page without either.
    pub fn content_box(&self) -> Option<BoundingBox> {
        self.lines()
            .iter()
            .map(|line| line.bounding_box())
            .chain(self.tables().iter().map(|table| table.bounding_box()))
            .reduce(|covered, next| covered.union(&next))
    }

    /// Outline of the page.
    pub fn polygon(&self) -> &'a [Point] {
        self.block()
            .block()
            .geometry
            .as_ref()
            .map(|g| g.polygon.as_slice())
            .unwrap_or(&[])
    }

    /// Check if the page has no lines, tables or forms.
    pub fn is_empty(&self) -> bool {
        self.data.lines.is_empty() && self.data.tables.is_empty() && self.data.forms.is_empty()
    }
}

impl std::fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("number", &self.data.number)
            .field("lines", &self.data.lines.len())
            .field("tables", &self.data.tables.len())
            .finish()
    }
}

/// A line of text on a page.
#[derive(Clone, Copy)]
pub struct Line<'a> {
    page: Page<'a>,
    data: &'a LineData,
}

impl<'a> Line<'a> {
    /// Backing LINE block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.page.doc, self.data.block)
    }

    /// Raw line text.
    pub fn text(&self) -> &'a str {
        &self.block().block().text
    }

    /// Word texts, in relationship order.
    pub fn words(&self) -> Vec<&'a str> {
        let arena = self.page.doc.arena();
        self.data
            .words
            .iter()
            .map(|&i| arena[i].text.as_str())
            .collect()
    }

    /// Word blocks, in relationship order.
    pub fn word_blocks(&self) -> Vec<BlockRef<'a>> {
        self.data
            .words
            .iter()
            .map(|&i| BlockRef::new(self.page.doc, i))
            .collect()
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().block().confidence
    }

    /// Bounding box of the line.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().block().bounding_box()
    }

    /// Owning page.
    pub fn page(&self) -> Page<'a> {
        self.page
    }
}

impl std::fmt::Debug for Line<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Line").field(&self.text()).finish()
    }
}
