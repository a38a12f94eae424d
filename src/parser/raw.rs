//! Wire-format records as produced by the analysis service.
//!
//! Every field is optional except the block list, and individual block
//! records may be `null`. Conversion into [`Block`] fills defaults instead of
//! failing.

use serde::{Deserialize, Serialize};

use crate::model::{
    Block, BlockType, BoundingBox, EntityType, Geometry, Point, QueryInfo, Relationship,
    RelationshipType, TextType,
};

/// One analysed document: metadata plus its flat block list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDocument {
    /// Document-level metadata
    #[serde(default)]
    pub document_metadata: Option<RawMetadata>,

    /// Block records; `null` entries are kept so they can be reported
    pub blocks: Vec<Option<RawBlock>>,

    /// Version of the analysis model
    #[serde(
        default,
        rename = "DetectDocumentTextModelVersion",
        alias = "AnalyzeDocumentModelVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub model_version: Option<String>,
}

/// Document-level metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMetadata {
    /// Declared page count
    #[serde(default)]
    pub pages: Option<i64>,
}

/// One block record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawBlock {
    pub id: Option<String>,
    pub block_type: Option<String>,
    pub entity_types: Option<Vec<String>>,
    pub text: Option<String>,
    pub text_type: Option<String>,
    pub confidence: Option<f64>,
    pub page: Option<i64>,
    pub geometry: Option<RawGeometry>,
    pub relationships: Option<Vec<RawRelationship>>,
    pub row_index: Option<i64>,
    pub column_index: Option<i64>,
    pub row_span: Option<i64>,
    pub column_span: Option<i64>,
    pub selection_status: Option<String>,
    pub query: Option<RawQuery>,
}

/// Geometry record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawGeometry {
    pub bounding_box: Option<RawBoundingBox>,
    pub polygon: Option<Vec<RawPoint>>,
}

/// Bounding box record (page-relative ratios).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawBoundingBox {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Polygon vertex record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Relationship record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawRelationship {
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    pub ids: Option<Vec<Option<String>>>,
}

/// Query record attached to QUERY blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawQuery {
    pub text: Option<String>,
    pub alias: Option<String>,
    pub pages: Option<Vec<String>>,
}

impl RawDocument {
    /// Declared page count, or 0 when absent or negative.
    pub fn declared_pages(&self) -> u32 {
        self.document_metadata
            .as_ref()
            .and_then(|m| m.pages)
            .map(to_u32)
            .unwrap_or(0)
    }
}

fn to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

impl From<RawBoundingBox> for BoundingBox {
    fn from(raw: RawBoundingBox) -> Self {
        BoundingBox::new(
            raw.left.unwrap_or_default(),
            raw.top.unwrap_or_default(),
            raw.width.unwrap_or_default(),
            raw.height.unwrap_or_default(),
        )
    }
}

impl From<RawGeometry> for Geometry {
    fn from(raw: RawGeometry) -> Self {
        let bounding_box = raw.bounding_box.map(BoundingBox::from).unwrap_or_default();
        let polygon = raw
            .polygon
            .unwrap_or_default()
            .into_iter()
            .map(|p| Point::new(p.x.unwrap_or_default(), p.y.unwrap_or_default()))
            .collect();
        Geometry::from_box(bounding_box).with_polygon(polygon)
    }
}

impl From<RawRelationship> for Relationship {
    fn from(raw: RawRelationship) -> Self {
        Relationship::new(
            raw.kind.map(RelationshipType::from).unwrap_or(RelationshipType::Child),
            raw.ids.unwrap_or_default().into_iter().flatten(),
        )
    }
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let block_type = raw
            .block_type
            .as_deref()
            .map(BlockType::from_wire)
            .unwrap_or(BlockType::Unknown);

        let mut block = Block::new(raw.id.unwrap_or_default(), block_type)
            .with_text(raw.text.unwrap_or_default())
            .with_confidence(raw.confidence.unwrap_or_default())
            .with_page(raw.page.map(to_u32).unwrap_or(0))
            .with_cell_position(
                raw.row_index.map(to_u32).unwrap_or(0),
                raw.column_index.map(to_u32).unwrap_or(0),
            )
            .with_span(
                raw.row_span.map(to_u32).unwrap_or(1),
                raw.column_span.map(to_u32).unwrap_or(1),
            )
            .with_selection_status(raw.selection_status.unwrap_or_default());

        block.entity_types = raw
            .entity_types
            .unwrap_or_default()
            .into_iter()
            .map(EntityType::from)
            .collect();
        block.relationships = raw
            .relationships
            .unwrap_or_default()
            .into_iter()
            .map(Relationship::from)
            .collect();
        block.geometry = raw.geometry.map(Geometry::from);
        block.text_type = match raw.text_type.as_deref() {
            Some("PRINTED") => Some(TextType::Printed),
            Some("HANDWRITING") => Some(TextType::Handwriting),
            _ => None,
        };
        block.query = raw.query.map(|q| QueryInfo {
            text: q.text.unwrap_or_default(),
            alias: q.alias,
            pages: q.pages.unwrap_or_default(),
        });

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_block_gets_defaults() {
        let raw: RawBlock = serde_json::from_str(r#"{"Id": "w1"}"#).unwrap();
        let block = Block::from(raw);
        assert_eq!(block.id, "w1");
        assert_eq!(block.block_type, BlockType::Unknown);
        assert_eq!(block.text, "");
        assert_eq!(block.confidence, 0.0);
        assert_eq!(block.row_span, 1);
        assert_eq!(block.column_span, 1);
        assert_eq!(block.row_index, 0);
        assert!(block.geometry.is_none());
        assert!(block.relationships.is_empty());
    }

    #[test]
    fn test_full_block_conversion() {
        let json = r#"{
            "Id": "c1",
            "BlockType": "CELL",
            "EntityTypes": ["COLUMN_HEADER"],
            "Confidence": 91.5,
            "Page": 2,
            "RowIndex": 1,
            "ColumnIndex": 3,
            "RowSpan": 0,
            "ColumnSpan": 2,
            "TextType": "HANDWRITING",
            "Geometry": {
                "BoundingBox": {"Width": 0.5, "Height": 0.1, "Left": 0.2, "Top": 0.3},
                "Polygon": [{"X": 0.2, "Y": 0.3}, {"X": 0.7}]
            },
            "Relationships": [{"Type": "CHILD", "Ids": ["w1", null, "w2"]}]
        }"#;
        let block = Block::from(serde_json::from_str::<RawBlock>(json).unwrap());

        assert_eq!(block.block_type, BlockType::Cell);
        assert_eq!(block.entity_types, vec![EntityType::ColumnHeader]);
        assert_eq!(block.page, 2);
        assert_eq!((block.row_index, block.column_index), (1, 3));
        assert_eq!((block.row_span, block.column_span), (1, 2));
        assert_eq!(block.text_type, Some(TextType::Handwriting));

        let geometry = block.geometry.as_ref().unwrap();
        assert_eq!(geometry.bounding_box.width, 0.5);
        assert_eq!(geometry.polygon[1], Point::new(0.7, 0.0));

        assert_eq!(block.relationships[0].kind, RelationshipType::Child);
        assert_eq!(block.relationships[0].ids, vec!["w1", "w2"]);
    }

    #[test]
    fn test_negative_numbers_clamp_to_zero() {
        let raw: RawBlock =
            serde_json::from_str(r#"{"Id": "x", "Page": -3, "RowIndex": -1}"#).unwrap();
        let block = Block::from(raw);
        assert_eq!(block.page, 0);
        assert_eq!(block.row_index, 0);
    }

    #[test]
    fn test_document_with_null_blocks_and_model_version() {
        let json = r#"{
            "DocumentMetadata": {"Pages": 4},
            "AnalyzeDocumentModelVersion": "1.0",
            "Blocks": [null, {"Id": "p1", "BlockType": "PAGE"}]
        }"#;
        let raw: RawDocument = serde_json::from_str(json).unwrap();
        assert_eq!(raw.declared_pages(), 4);
        assert_eq!(raw.model_version.as_deref(), Some("1.0"));
        assert!(raw.blocks[0].is_none());
        assert!(raw.blocks[1].is_some());
    }

    #[test]
    fn test_missing_blocks_is_an_error() {
        assert!(serde_json::from_str::<RawDocument>(r#"{"DocumentMetadata": {}}"#).is_err());
    }

    #[test]
    fn test_query_record() {
        let json = r#"{"Id": "q1", "BlockType": "QUERY", "Query": {"Text": "Total?", "Alias": "TOTAL"}}"#;
        let block = Block::from(serde_json::from_str::<RawBlock>(json).unwrap());
        let query = block.query.unwrap();
        assert_eq!(query.text, "Total?");
        assert_eq!(query.alias.as_deref(), Some("TOTAL"));
        assert!(query.pages.is_empty());
    }
}
