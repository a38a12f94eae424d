//! Block types: the atomic nodes of the layout-analysis graph.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::{BoundingBox, Document, Geometry};

/// Nesting limit for text synthesis over malformed (cyclic) CHILD graphs.
const MAX_TEXT_DEPTH: usize = 16;

/// Structural role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// A physical page
    Page,
    /// A line of text
    Line,
    /// A single word
    Word,
    /// A table
    Table,
    /// A table cell
    Cell,
    /// A form key or value (see the entity types)
    KeyValueSet,
    /// A checkbox or radio button
    SelectionElement,
    /// A detected signature
    Signature,
    /// A question posed to the analysis service
    Query,
    /// An answer to a query
    QueryResult,
    /// Any block type this library does not model
    #[serde(other)]
    Unknown,
}

impl BlockType {
    /// Wire name of the block type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Page => "PAGE",
            BlockType::Line => "LINE",
            BlockType::Word => "WORD",
            BlockType::Table => "TABLE",
            BlockType::Cell => "CELL",
            BlockType::KeyValueSet => "KEY_VALUE_SET",
            BlockType::SelectionElement => "SELECTION_ELEMENT",
            BlockType::Signature => "SIGNATURE",
            BlockType::Query => "QUERY",
            BlockType::QueryResult => "QUERY_RESULT",
            BlockType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire name. Unrecognised names map to [`BlockType::Unknown`].
    pub fn from_wire(name: &str) -> Self {
        match name {
            "PAGE" => BlockType::Page,
            "LINE" => BlockType::Line,
            "WORD" => BlockType::Word,
            "TABLE" => BlockType::Table,
            "CELL" => BlockType::Cell,
            "KEY_VALUE_SET" => BlockType::KeyValueSet,
            "SELECTION_ELEMENT" => BlockType::SelectionElement,
            "SIGNATURE" => BlockType::Signature,
            "QUERY" => BlockType::Query,
            "QUERY_RESULT" => BlockType::QueryResult,
            _ => BlockType::Unknown,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match BlockType::from_wire(&normalized) {
            BlockType::Unknown => Err(format!("unknown block type: {}", s)),
            block_type => Ok(block_type),
        }
    }
}

/// Semantic tag refining a block's role within its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    /// Field key of a key/value pair
    Key,
    /// Field value of a key/value pair
    Value,
    /// Column header cell
    ColumnHeader,
    /// Title cell within a table
    TableTitle,
    /// Footer cell of a table
    TableFooter,
    /// Section title cell spanning a table row
    TableSectionTitle,
    /// Summary cell of a table
    TableSummary,
    /// Table with column headers
    StructuredTable,
    /// Table without regular structure
    SemiStructuredTable,
    /// Any other tag, kept verbatim
    Other(String),
}

impl EntityType {
    /// Wire name of the entity type.
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Key => "KEY",
            EntityType::Value => "VALUE",
            EntityType::ColumnHeader => "COLUMN_HEADER",
            EntityType::TableTitle => "TABLE_TITLE",
            EntityType::TableFooter => "TABLE_FOOTER",
            EntityType::TableSectionTitle => "TABLE_SECTION_TITLE",
            EntityType::TableSummary => "TABLE_SUMMARY",
            EntityType::StructuredTable => "STRUCTURED_TABLE",
            EntityType::SemiStructuredTable => "SEMI_STRUCTURED_TABLE",
            EntityType::Other(name) => name,
        }
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        match name {
            "KEY" => EntityType::Key,
            "VALUE" => EntityType::Value,
            "COLUMN_HEADER" => EntityType::ColumnHeader,
            "TABLE_TITLE" => EntityType::TableTitle,
            "TABLE_FOOTER" => EntityType::TableFooter,
            "TABLE_SECTION_TITLE" => EntityType::TableSectionTitle,
            "TABLE_SUMMARY" => EntityType::TableSummary,
            "STRUCTURED_TABLE" => EntityType::StructuredTable,
            "SEMI_STRUCTURED_TABLE" => EntityType::SemiStructuredTable,
            other => EntityType::Other(other.to_string()),
        }
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        EntityType::from(name.as_str())
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.as_str().to_string()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a relationship edge between blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipType {
    /// Containment: the targets are found within this block
    Child,
    /// Key to value link of a key/value pair
    Value,
    /// Query to query-result link
    Answer,
    /// Table to merged-cell link
    MergedCell,
    /// Link to an associated table
    Table,
    /// Table to its title
    TableTitle,
    /// Table to its footer
    TableFooter,
    /// Additional analysis features
    ComplexFeatures,
    /// Link to a title block
    Title,
    /// Any other edge type, kept verbatim
    Other(String),
}

impl RelationshipType {
    /// Wire name of the relationship type.
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipType::Child => "CHILD",
            RelationshipType::Value => "VALUE",
            RelationshipType::Answer => "ANSWER",
            RelationshipType::MergedCell => "MERGED_CELL",
            RelationshipType::Table => "TABLE",
            RelationshipType::TableTitle => "TABLE_TITLE",
            RelationshipType::TableFooter => "TABLE_FOOTER",
            RelationshipType::ComplexFeatures => "COMPLEX_FEATURES",
            RelationshipType::Title => "TITLE",
            RelationshipType::Other(name) => name,
        }
    }
}

impl From<&str> for RelationshipType {
    fn from(name: &str) -> Self {
        match name {
            "CHILD" => RelationshipType::Child,
            "VALUE" => RelationshipType::Value,
            "ANSWER" => RelationshipType::Answer,
            "MERGED_CELL" => RelationshipType::MergedCell,
            "TABLE" => RelationshipType::Table,
            "TABLE_TITLE" => RelationshipType::TableTitle,
            "TABLE_FOOTER" => RelationshipType::TableFooter,
            "COMPLEX_FEATURES" => RelationshipType::ComplexFeatures,
            "TITLE" => RelationshipType::Title,
            other => RelationshipType::Other(other.to_string()),
        }
    }
}

impl From<String> for RelationshipType {
    fn from(name: String) -> Self {
        RelationshipType::from(name.as_str())
    }
}

impl From<RelationshipType> for String {
    fn from(kind: RelationshipType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked state of a selection element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionStatus {
    /// Checked
    Selected,
    /// Unchecked, or any unrecognised raw status
    #[default]
    NotSelected,
}

impl SelectionStatus {
    /// Interpret a raw status string. Only `"SELECTED"` counts as selected.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "SELECTED" => SelectionStatus::Selected,
            _ => SelectionStatus::NotSelected,
        }
    }

    /// Check if this status is selected.
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionStatus::Selected)
    }
}

/// Whether text was printed or handwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextType {
    /// Machine-printed text
    Printed,
    /// Handwritten text
    Handwriting,
}

/// Question attached to a QUERY block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Question text
    pub text: String,

    /// Caller-chosen alias for the question
    pub alias: Option<String>,

    /// Page selectors the question was asked against
    pub pages: Vec<String>,
}

/// A typed edge from a block to other blocks, by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Edge type
    pub kind: RelationshipType,

    /// Target block identifiers, in order
    pub ids: Vec<String>,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new<S: Into<String>>(kind: RelationshipType, ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolved edge: arena indices of the targets that exist.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) kind: RelationshipType,
    pub(crate) targets: Vec<usize>,
}

/// One node of the layout-analysis graph.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Identifier, unique within a document
    pub id: String,

    /// Structural role
    pub block_type: BlockType,

    /// Semantic tags
    pub entity_types: Vec<EntityType>,

    /// Raw text (WORD, LINE, SELECTION_ELEMENT; empty otherwise)
    pub text: String,

    /// Printed or handwritten
    pub text_type: Option<TextType>,

    /// Confidence score (0-100)
    pub confidence: f64,

    /// Page number (1-indexed, 0 when not declared)
    pub page: u32,

    /// Location on the page
    pub geometry: Option<Geometry>,

    /// Outgoing edges, in input order
    pub relationships: Vec<Relationship>,

    /// Row of a table cell (0-indexed)
    pub row_index: u32,

    /// Column of a table cell (0-indexed)
    pub column_index: u32,

    /// Rows spanned by a table cell (at least 1)
    pub row_span: u32,

    /// Columns spanned by a table cell (at least 1)
    pub column_span: u32,

    /// Raw selection status string
    pub selection_status: String,

    /// Question of a QUERY block
    pub query: Option<QueryInfo>,

    #[serde(skip)]
    pub(crate) links: Vec<Link>,

    #[serde(skip)]
    pub(crate) parents: Vec<usize>,
}

impl Block {
    /// Create a new block with default fields.
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            entity_types: Vec::new(),
            text: String::new(),
            text_type: None,
            confidence: 0.0,
            page: 0,
            geometry: None,
            relationships: Vec::new(),
            row_index: 0,
            column_index: 0,
            row_span: 1,
            column_span: 1,
            selection_status: String::new(),
            query: None,
            links: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Set raw text and return self.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set confidence and return self.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set page number and return self.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Add an entity type and return self.
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    /// Set geometry and return self.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set a bounding box and return self.
    pub fn with_bounding_box(self, bounding_box: BoundingBox) -> Self {
        self.with_geometry(Geometry::from_box(bounding_box))
    }

    /// Add a relationship and return self.
    pub fn with_relationship<S: Into<String>>(
        mut self,
        kind: RelationshipType,
        ids: impl IntoIterator<Item = S>,
    ) -> Self {
        self.relationships.push(Relationship::new(kind, ids));
        self
    }

    /// Add a CHILD relationship and return self.
    pub fn with_children<S: Into<String>>(self, ids: impl IntoIterator<Item = S>) -> Self {
        self.with_relationship(RelationshipType::Child, ids)
    }

    /// Set table cell position and return self.
    pub fn with_cell_position(mut self, row: u32, column: u32) -> Self {
        self.row_index = row;
        self.column_index = column;
        self
    }

    /// Set table cell spans and return self. Zero spans become 1.
    pub fn with_span(mut self, row_span: u32, column_span: u32) -> Self {
        self.row_span = row_span.max(1);
        self.column_span = column_span.max(1);
        self
    }

    /// Set raw selection status and return self.
    pub fn with_selection_status(mut self, status: impl Into<String>) -> Self {
        self.selection_status = status.into();
        self
    }

    /// Set query info and return self.
    pub fn with_query(mut self, query: QueryInfo) -> Self {
        self.query = Some(query);
        self
    }

    /// Check if the block carries an entity type.
    pub fn has_entity_type(&self, entity_type: &EntityType) -> bool {
        self.entity_types.contains(entity_type)
    }

    /// Check if this is a KEY_VALUE_SET tagged KEY.
    pub fn is_key(&self) -> bool {
        self.block_type == BlockType::KeyValueSet && self.has_entity_type(&EntityType::Key)
    }

    /// Check if this is a KEY_VALUE_SET tagged VALUE.
    pub fn is_value(&self) -> bool {
        self.block_type == BlockType::KeyValueSet && self.has_entity_type(&EntityType::Value)
    }

    /// Interpreted selection status.
    pub fn selection(&self) -> SelectionStatus {
        SelectionStatus::from_raw(&self.selection_status)
    }

    /// Bounding box, or an empty box when the block has no geometry.
    pub fn bounding_box(&self) -> BoundingBox {
        self.geometry
            .as_ref()
            .map(|g| g.bounding_box)
            .unwrap_or_default()
    }

    /// Raw target identifiers of all edges of one type.
    pub fn relationship_ids<'s>(
        &'s self,
        kind: &'s RelationshipType,
    ) -> impl Iterator<Item = &'s str> + 's {
        self.relationships
            .iter()
            .filter(move |r| &r.kind == kind)
            .flat_map(|r| r.ids.iter().map(String::as_str))
    }

    /// Check if this cell spans more than one row or column.
    pub fn is_spanning(&self) -> bool {
        self.row_span > 1 || self.column_span > 1
    }
}

/// Handle to a block inside a [`Document`], with graph navigation.
#[derive(Clone, Copy)]
pub struct BlockRef<'a> {
    doc: &'a Document,
    index: usize,
}

impl<'a> BlockRef<'a> {
    pub(crate) fn new(doc: &'a Document, index: usize) -> Self {
        Self { doc, index }
    }

    /// The underlying block.
    pub fn block(&self) -> &'a Block {
        &self.doc.arena()[self.index]
    }

    /// Position of the block in the document's arena.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Owning document.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Resolved targets of every edge of one type, in edge order.
    pub fn related(&self, kind: &RelationshipType) -> Vec<BlockRef<'a>> {
        let doc = self.doc;
        self.block()
            .links
            .iter()
            .filter(|link| &link.kind == kind)
            .flat_map(|link| link.targets.iter().map(move |&i| BlockRef::new(doc, i)))
            .collect()
    }

    /// Resolved CHILD targets, in relationship order.
    pub fn children(&self) -> Vec<BlockRef<'a>> {
        self.related(&RelationshipType::Child)
    }

    /// Resolved CHILD targets of one block type.
    pub fn children_of_type(&self, block_type: BlockType) -> Vec<BlockRef<'a>> {
        self.children()
            .into_iter()
            .filter(|child| child.block_type == block_type)
            .collect()
    }

    /// Blocks that list this block as a CHILD.
    pub fn parents(&self) -> Vec<BlockRef<'a>> {
        self.block()
            .parents
            .iter()
            .map(|&i| BlockRef::new(self.doc, i))
            .collect()
    }

    /// Text of the block, synthesized from its children for composite types.
    pub fn text(&self) -> Cow<'a, str> {
        self.text_at_depth(0)
    }

    fn text_at_depth(&self, depth: usize) -> Cow<'a, str> {
        let block = self.block();
        if depth >= MAX_TEXT_DEPTH {
            return Cow::Borrowed(block.text.as_str());
        }

        match block.block_type {
            BlockType::Word | BlockType::Line | BlockType::SelectionElement => {
                Cow::Borrowed(block.text.as_str())
            }
            BlockType::Cell => Cow::Owned(
                self.children()
                    .iter()
                    .map(|child| child.text_at_depth(depth + 1))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            BlockType::Table => Cow::Owned(self.table_text(depth)),
            BlockType::KeyValueSet => Cow::Owned(
                self.children()
                    .iter()
                    .map(|child| child.text_at_depth(depth + 1))
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(": "),
            ),
            BlockType::Page => Cow::Owned(
                self.children_of_type(BlockType::Line)
                    .iter()
                    .map(|line| line.text_at_depth(depth + 1))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            BlockType::Signature
            | BlockType::Query
            | BlockType::QueryResult
            | BlockType::Unknown => Cow::Borrowed(block.text.as_str()),
        }
    }

    fn table_text(&self, depth: usize) -> String {
        let mut rows: BTreeMap<u32, Vec<(u32, Cow<'a, str>)>> = BTreeMap::new();
        for cell in self.children_of_type(BlockType::Cell) {
            rows.entry(cell.row_index)
                .or_default()
                .push((cell.column_index, cell.text_at_depth(depth + 1)));
        }

        rows.into_values()
            .map(|mut cells| {
                cells.sort_by_key(|(column, _)| *column);
                cells
                    .into_iter()
                    .map(|(_, text)| text)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> Deref for BlockRef<'a> {
    type Target = Block;

    fn deref(&self) -> &Block {
        self.block()
    }
}

impl fmt::Debug for BlockRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRef")
            .field("id", &self.block().id)
            .field("block_type", &self.block().block_type)
            .finish()
    }
}

impl PartialEq for BlockRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.index == other.index
    }
}
