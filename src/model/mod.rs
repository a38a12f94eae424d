//! Document model types for layout-analysis output.
//!
//! Blocks live in one arena owned by [`Document`]. Every other type here
//! ([`Page`], [`Table`], [`Form`], [`Query`], ...) is a cheap `Copy` view
//! borrowing from that document, so back-references such as
//! `cell.table().page().document()` cost nothing and can never dangle.

mod block;
mod document;
mod form;
mod geometry;
mod page;
mod query;
mod table;

pub use block::{
    Block, BlockRef, BlockType, EntityType, QueryInfo, Relationship, RelationshipType,
    SelectionStatus, TextType,
};
pub(crate) use block::Link;
pub use document::{Document, DocumentMetadata, FilterOptions};
pub use form::{Form, KeyValue, SelectionElement};
pub use geometry::{BoundingBox, Geometry, Point};
pub(crate) use page::PageData;
pub use page::{Line, Page};
pub use query::{Query, QueryResult};
pub use table::{Cell, MergedCell, Table, TableRow};
