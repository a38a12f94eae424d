//! Query and answer types.

use std::borrow::Cow;

use super::page::expect_type;
use super::{BlockRef, BlockType, BoundingBox, Page, RelationshipType};
use crate::error::Result;

#[derive(Debug)]
pub(crate) struct QueryData {
    pub(crate) block: usize,
    pub(crate) results: Vec<usize>,
}

impl QueryData {
    pub(crate) fn new(block: BlockRef<'_>) -> Result<Self> {
        expect_type(&block, BlockType::Query)?;
        let results = block
            .related(&RelationshipType::Answer)
            .into_iter()
            .filter(|answer| answer.block_type == BlockType::QueryResult)
            .map(|answer| answer.index())
            .collect();
        Ok(Self {
            block: block.index(),
            results,
        })
    }
}

/// A question asked about a page.
#[derive(Clone, Copy)]
pub struct Query<'a> {
    page: Page<'a>,
    data: &'a QueryData,
}

impl<'a> Query<'a> {
    pub(crate) fn new(page: Page<'a>, data: &'a QueryData) -> Self {
        Self { page, data }
    }

    /// Backing QUERY block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.page.document(), self.data.block)
    }

    /// Question text: the block text, else the attached question.
    pub fn text(&self) -> &'a str {
        let block = self.block().block();
        match &block.query {
            Some(query) if block.text.is_empty() => &query.text,
            _ => &block.text,
        }
    }

    /// Alias given to the question, if any.
    pub fn alias(&self) -> Option<&'a str> {
        self.block().block().query.as_ref()?.alias.as_deref()
    }

    /// Answers, in ANSWER edge order.
    pub fn results(&self) -> Vec<QueryResult<'a>> {
        self.data
            .results
            .iter()
            .map(|&block| QueryResult { query: *self, block })
            .collect()
    }

    /// Answer with the highest confidence. Ties go to the earliest.
    pub fn top_result(&self) -> Option<QueryResult<'a>> {
        self.results().into_iter().reduce(|best, next| {
            if next.confidence() > best.confidence() {
                next
            } else {
                best
            }
        })
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().confidence
    }

    /// Page the question was asked about.
    pub fn page(&self) -> Page<'a> {
        self.page
    }
}

impl std::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("text", &self.text())
            .field("results", &self.data.results.len())
            .finish()
    }
}

/// One answer to a [`Query`].
#[derive(Clone, Copy)]
pub struct QueryResult<'a> {
    query: Query<'a>,
    block: usize,
}

impl<'a> QueryResult<'a> {
    /// Backing QUERY_RESULT block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.query.page.document(), self.block)
    }

    /// Answer text.
    pub fn text(&self) -> Cow<'a, str> {
        self.block().text()
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().confidence
    }

    /// Bounding box of the answer.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().bounding_box()
    }

    /// Question this answers.
    pub fn query(&self) -> Query<'a> {
        self.query
    }
}

impl std::fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueryResult").field(&self.text()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Document, DocumentMetadata, QueryInfo};
    use crate::parser::ParseOptions;

    fn question(text: &str, alias: Option<&str>) -> QueryInfo {
        QueryInfo {
            text: text.to_string(),
            alias: alias.map(str::to_string),
            pages: vec!["1".to_string()],
        }
    }

    fn sample() -> Document {
        let blocks = vec![
            Block::new("p1", BlockType::Page).with_page(1),
            Block::new("q1", BlockType::Query)
                .with_page(1)
                .with_query(question("What is the total?", Some("TOTAL")))
                .with_relationship(RelationshipType::Answer, ["r1", "missing", "r2", "w1"]),
            Block::new("r1", BlockType::QueryResult)
                .with_text("$10")
                .with_confidence(70.0),
            Block::new("r2", BlockType::QueryResult)
                .with_text("$12")
                .with_confidence(95.0),
            Block::new("w1", BlockType::Word).with_text("noise"),
        ];
        Document::from_blocks(blocks, DocumentMetadata::default(), &ParseOptions::default())
            .unwrap()
    }

    #[test]
    fn test_query_results_skip_dangling_and_foreign_targets() {
        let doc = sample();
        let query = doc.pages()[0].queries()[0];
        assert_eq!(query.text(), "What is the total?");
        assert_eq!(query.alias(), Some("TOTAL"));

        let answers: Vec<_> = query.results().iter().map(|r| r.text()).collect();
        assert_eq!(answers, vec!["$10", "$12"]);
        assert_eq!(query.results()[0].query().text(), "What is the total?");
    }

    #[test]
    fn test_top_result_by_confidence() {
        let doc = sample();
        let query = doc.queries()[0];
        assert_eq!(query.top_result().unwrap().text(), "$12");
        assert_eq!(query.page().number(), 1);
    }

    #[test]
    fn test_answer_by_text_or_alias() {
        let doc = sample();
        assert_eq!(doc.answer("total").unwrap().text(), "$12");
        assert_eq!(doc.answer("what is the total?").unwrap().text(), "$12");
        assert!(doc.answer("Who signed?").is_none());
    }

    #[test]
    fn test_block_text_wins_over_question() {
        let doc = Document::from_blocks(
            vec![
                Block::new("p1", BlockType::Page).with_children(["q1"]),
                Block::new("q1", BlockType::Query)
                    .with_text("Inline")
                    .with_query(question("Attached", None)),
            ],
            DocumentMetadata::default(),
            &ParseOptions::default(),
        )
        .unwrap();
        let query = doc.queries()[0];
        assert_eq!(query.text(), "Inline");
        assert!(query.alias().is_none());
        assert!(query.top_result().is_none());
    }

    #[test]
    fn test_query_from_wrong_block_fails() {
        let doc = sample();
        assert!(QueryData::new(doc.block("r1").unwrap())
            .unwrap_err()
            .is_structural());
    }
}
