//! Document-level types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::page::PageData;
use super::{Block, BlockRef, BlockType, EntityType, KeyValue, Page, Query, QueryResult};
use crate::error::{Error, Result};
use crate::parser::{builder, ParseOptions};

/// A document model built from one block list.
///
/// Owns every block (in input order) and the assembled pages. All navigation
/// types ([`Page`], [`crate::model::Table`], [`crate::model::Form`], ...) are
/// cheap borrowed views into it. A document is never mutated after it is
/// built, so it can be shared freely across threads.
#[derive(Debug)]
pub struct Document {
    metadata: DocumentMetadata,
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
    pages: Vec<PageData>,
}

impl Document {
    /// Build a document from blocks.
    ///
    /// Runs the two-pass build: index every block by id, resolve
    /// relationships, then assemble pages in page-number order.
    ///
    /// # Example
    ///
    /// ```
    /// use layoutdoc::{Block, BlockType, Document, DocumentMetadata, ParseOptions};
    ///
    /// let blocks = vec![
    ///     Block::new("p1", BlockType::Page).with_page(1).with_children(["l1"]),
    ///     Block::new("l1", BlockType::Line).with_text("Hello World"),
    /// ];
    /// let doc = Document::from_blocks(blocks, DocumentMetadata::default(), &ParseOptions::default())?;
    /// assert_eq!(doc.page_count(), 1);
    /// assert_eq!(doc.pages()[0].lines()[0].text(), "Hello World");
    /// # Ok::<(), layoutdoc::Error>(())
    /// ```
    pub fn from_blocks(
        blocks: Vec<Block>,
        metadata: DocumentMetadata,
        options: &ParseOptions,
    ) -> Result<Self> {
        builder::build(blocks, metadata, options)
    }

    pub(crate) fn indexed(
        metadata: DocumentMetadata,
        blocks: Vec<Block>,
        index: HashMap<String, usize>,
    ) -> Self {
        Self {
            metadata,
            blocks,
            index,
            pages: Vec::new(),
        }
    }

    pub(crate) fn set_pages(&mut self, pages: Vec<PageData>) {
        if self.metadata.pages == 0 {
            self.metadata.pages = pages.len() as u32;
        }
        self.pages = pages;
    }

    pub(crate) fn arena(&self) -> &[Block] {
        &self.blocks
    }

    /// All pages, in page-number order.
    pub fn pages(&self) -> Vec<Page<'_>> {
        self.pages.iter().map(|data| Page::new(self, data)).collect()
    }

    /// Get a page by position (0-indexed).
    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        self.pages
            .get(index)
            .map(|data| Page::new(self, data))
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }

    /// Get a page by its page number (1-indexed).
    pub fn page_by_number(&self, number: u32) -> Option<Page<'_>> {
        self.pages
            .iter()
            .find(|data| data.number == number)
            .map(|data| Page::new(self, data))
    }

    /// Number of pages, as declared by the input metadata.
    ///
    /// Falls back to the number of assembled pages when the input does not
    /// declare a count.
    pub fn page_count(&self) -> u32 {
        self.metadata.pages
    }

    /// Document metadata.
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Look up a block by identifier.
    pub fn block(&self, id: &str) -> Option<BlockRef<'_>> {
        self.index.get(id).map(|&i| BlockRef::new(self, i))
    }

    /// All blocks, in input order.
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = BlockRef<'_>> + '_ {
        (0..self.blocks.len()).map(move |i| BlockRef::new(self, i))
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Blocks matching every condition of the filter, in input order.
    pub fn filter_blocks(&self, options: &FilterOptions) -> Vec<BlockRef<'_>> {
        self.blocks()
            .filter(|block| options.matches(block.block()))
            .collect()
    }

    /// Key/value pairs whose key matches, across all pages in page order.
    pub fn find_key_value_pairs(&self, key: &str) -> Vec<KeyValue<'_>> {
        self.pages()
            .into_iter()
            .flat_map(|page| page.forms())
            .flat_map(|form| form.search_fields_by_key(key))
            .collect()
    }

    /// All queries, in page order.
    pub fn queries(&self) -> Vec<Query<'_>> {
        self.pages()
            .into_iter()
            .flat_map(|page| page.queries())
            .collect()
    }

    /// Best-scoring answer to a query, matched by question text or alias.
    pub fn answer(&self, question: &str) -> Option<QueryResult<'_>> {
        let question = question.trim().to_lowercase();
        self.queries()
            .into_iter()
            .filter(|query| {
                query.text().trim().to_lowercase() == question
                    || query
                        .alias()
                        .is_some_and(|alias| alias.to_lowercase() == question)
            })
            .find_map(|query| query.top_result())
    }

    /// Get plain text content of the entire document.
    pub fn text(&self) -> String {
        self.pages()
            .iter()
            .map(|page| page.text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Total number of pages
    pub pages: u32,

    /// Version of the analysis model that produced the blocks
    pub model_version: Option<String>,
}

impl DocumentMetadata {
    /// Create metadata with a page count.
    pub fn with_pages(pages: u32) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }
}

/// Conditions for [`Document::filter_blocks`].
///
/// All conditions must hold. An empty type list accepts any type.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Minimum confidence (inclusive)
    pub min_confidence: f64,

    /// Accepted block types
    pub block_types: Vec<BlockType>,

    /// Accepted entity types; a block matches if any of its tags is listed
    pub entity_types: Vec<EntityType>,
}

impl FilterOptions {
    /// Create a filter that accepts every block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum confidence.
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Accept a block type.
    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_types.push(block_type);
        self
    }

    /// Accept an entity type.
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    /// Check if a block satisfies the filter.
    pub fn matches(&self, block: &Block) -> bool {
        if block.confidence < self.min_confidence {
            return false;
        }

        if !self.block_types.is_empty() && !self.block_types.contains(&block.block_type) {
            return false;
        }

        if !self.entity_types.is_empty()
            && !block
                .entity_types
                .iter()
                .any(|et| self.entity_types.contains(et))
        {
            return false;
        }

        true
    }
}
