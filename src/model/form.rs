//! Form types: key/value fields and selection elements.

use indexmap::IndexMap;

use super::page::expect_type;
use super::{
    BlockRef, BlockType, BoundingBox, Document, EntityType, Page, RelationshipType,
    SelectionStatus,
};
use crate::error::{Error, Result};
use crate::parser::ParseOptions;

#[derive(Debug)]
pub(crate) struct FormData {
    pub(crate) fields: Vec<KeyValueData>,
    pub(crate) selection_elements: Vec<usize>,
    /// exact key text -> indices into `fields`, in insertion order
    pub(crate) index: IndexMap<String, Vec<usize>>,
}

impl FormData {
    /// Pair the KEY blocks among `members` with their VALUE blocks.
    ///
    /// Returns `None` when the page has neither fields nor selection elements.
    pub(crate) fn build(
        doc: &Document,
        members: &[usize],
        options: &ParseOptions,
    ) -> Result<Option<Self>> {
        let mut fields = Vec::new();
        let mut selection_elements = Vec::new();
        let mut index: IndexMap<String, Vec<usize>> = IndexMap::new();

        for &member in members {
            let block = BlockRef::new(doc, member);
            match block.block_type {
                BlockType::SelectionElement => selection_elements.push(member),
                BlockType::KeyValueSet if block.is_key() => {
                    let Some(value) = value_of(block) else {
                        log::debug!("Key {} has no value block", block.id);
                        continue;
                    };

                    let field = match KeyValueData::new(block, value) {
                        Ok(field) => field,
                        Err(e) if options.is_lenient() => {
                            log::warn!("Skipping key/value pair: {}", e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let confidence = block.confidence.min(value.confidence);
                    if confidence < options.confidence_threshold {
                        log::debug!(
                            "Dropping key/value pair {} below confidence threshold ({:.1})",
                            block.id,
                            confidence
                        );
                        continue;
                    }

                    index
                        .entry(field.key_text.clone())
                        .or_default()
                        .push(fields.len());
                    fields.push(field);
                }
                _ => {}
            }
        }

        if fields.is_empty() && selection_elements.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            fields,
            selection_elements,
            index,
        }))
    }
}

/// The value block of a key: first VALUE target, else first KEY_VALUE_SET child.
fn value_of(key: BlockRef<'_>) -> Option<BlockRef<'_>> {
    key.related(&RelationshipType::Value)
        .into_iter()
        .next()
        .or_else(|| {
            key.children_of_type(BlockType::KeyValueSet)
                .into_iter()
                .next()
        })
}

#[derive(Debug)]
pub(crate) struct KeyValueData {
    pub(crate) key: usize,
    pub(crate) value: usize,
    pub(crate) key_text: String,
    pub(crate) value_text: String,
}

impl KeyValueData {
    /// Validate a KEY/VALUE block pair and extract its texts.
    pub(crate) fn new(key: BlockRef<'_>, value: BlockRef<'_>) -> Result<Self> {
        expect_type(&key, BlockType::KeyValueSet)?;
        expect_type(&value, BlockType::KeyValueSet)?;
        expect_entity(&key, EntityType::Key)?;
        expect_entity(&value, EntityType::Value)?;

        let key_text = key
            .children_of_type(BlockType::Word)
            .iter()
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let value_text = value
            .children()
            .iter()
            .map(|child| child.text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            key: key.index(),
            value: value.index(),
            key_text,
            value_text,
        })
    }
}

fn expect_entity(block: &BlockRef<'_>, expected: EntityType) -> Result<()> {
    if block.has_entity_type(&expected) {
        Ok(())
    } else {
        Err(Error::MissingEntityType {
            id: block.id.clone(),
            expected,
        })
    }
}

/// Form content of one page.
#[derive(Clone, Copy)]
pub struct Form<'a> {
    page: Page<'a>,
    data: &'a FormData,
}

impl<'a> Form<'a> {
    pub(crate) fn new(page: Page<'a>, data: &'a FormData) -> Self {
        Self { page, data }
    }

    fn field(&self, index: usize) -> KeyValue<'a> {
        KeyValue {
            form: *self,
            data: &self.data.fields[index],
        }
    }

    fn fields_at(&self, indices: &[usize]) -> Vec<KeyValue<'a>> {
        indices.iter().map(|&i| self.field(i)).collect()
    }

    /// All key/value fields, in page order.
    pub fn fields(&self) -> Vec<KeyValue<'a>> {
        (0..self.data.fields.len()).map(|i| self.field(i)).collect()
    }

    /// All selection elements on the page.
    pub fn selection_elements(&self) -> Vec<SelectionElement<'a>> {
        self.data
            .selection_elements
            .iter()
            .map(|&block| SelectionElement { form: *self, block })
            .collect()
    }

    /// First field whose key matches exactly, else case-insensitively.
    pub fn field_by_key(&self, key: &str) -> Option<KeyValue<'a>> {
        if let Some(indices) = self.data.index.get(key) {
            return indices.first().map(|&i| self.field(i));
        }
        let wanted = key.to_lowercase();
        self.data
            .index
            .iter()
            .find(|(text, _)| text.to_lowercase() == wanted)
            .and_then(|(_, indices)| indices.first())
            .map(|&i| self.field(i))
    }

    /// All fields whose key matches exactly. When none do, all fields whose
    /// key matches case-insensitively.
    pub fn search_fields_by_key(&self, key: &str) -> Vec<KeyValue<'a>> {
        if let Some(indices) = self.data.index.get(key) {
            return self.fields_at(indices);
        }

        let wanted = key.to_lowercase();
        self.data
            .index
            .iter()
            .filter(|(text, _)| text.to_lowercase() == wanted)
            .flat_map(|(_, indices)| self.fields_at(indices))
            .collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.data.fields.len()
    }

    /// Check if the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.data.fields.is_empty()
    }

    /// Owning page.
    pub fn page(&self) -> Page<'a> {
        self.page
    }
}

impl std::fmt::Debug for Form<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("page", &self.page.number())
            .field("fields", &self.data.fields.len())
            .field("selection_elements", &self.data.selection_elements.len())
            .finish()
    }
}

/// A key paired with its value.
#[derive(Clone, Copy)]
pub struct KeyValue<'a> {
    form: Form<'a>,
    data: &'a KeyValueData,
}

impl<'a> KeyValue<'a> {
    /// KEY block.
    pub fn key(&self) -> BlockRef<'a> {
        BlockRef::new(self.form.page.document(), self.data.key)
    }

    /// VALUE block.
    pub fn value(&self) -> BlockRef<'a> {
        BlockRef::new(self.form.page.document(), self.data.value)
    }

    /// Key word texts joined by spaces.
    pub fn key_text(&self) -> &'a str {
        &self.data.key_text
    }

    /// Non-empty value child texts joined by spaces.
    pub fn value_text(&self) -> &'a str {
        &self.data.value_text
    }

    /// Lower of the key and value confidences.
    pub fn confidence(&self) -> f64 {
        self.key().confidence.min(self.value().confidence)
    }

    /// Checkbox inside the value, if any.
    pub fn selection_element(&self) -> Option<SelectionElement<'a>> {
        self.value()
            .children_of_type(BlockType::SelectionElement)
            .first()
            .map(|block| SelectionElement {
                form: self.form,
                block: block.index(),
            })
    }

    /// Owning form.
    pub fn form(&self) -> Form<'a> {
        self.form
    }
}

impl std::fmt::Debug for KeyValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValue")
            .field("key", &self.key_text())
            .field("value", &self.value_text())
            .finish()
    }
}

/// A checkbox or radio button.
#[derive(Clone, Copy)]
pub struct SelectionElement<'a> {
    form: Form<'a>,
    block: usize,
}

impl<'a> SelectionElement<'a> {
    /// Backing SELECTION_ELEMENT block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.form.page.document(), self.block)
    }

    /// Interpreted status.
    pub fn status(&self) -> SelectionStatus {
        self.block().selection()
    }

    /// Check if the element is selected.
    pub fn is_selected(&self) -> bool {
        self.status().is_selected()
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().confidence
    }

    /// Bounding box of the element.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().bounding_box()
    }

    /// Owning form.
    pub fn form(&self) -> Form<'a> {
        self.form
    }
}

impl std::fmt::Debug for SelectionElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionElement")
            .field("id", &self.block().id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, DocumentMetadata};

    fn key(id: &str, value: &str, words: &[&str]) -> Block {
        Block::new(id, BlockType::KeyValueSet)
            .with_entity_type(EntityType::Key)
            .with_confidence(90.0)
            .with_page(1)
            .with_relationship(RelationshipType::Value, [value])
            .with_children(words.iter().copied())
    }

    fn value(id: &str, words: &[&str]) -> Block {
        Block::new(id, BlockType::KeyValueSet)
            .with_entity_type(EntityType::Value)
            .with_confidence(80.0)
            .with_page(1)
            .with_children(words.iter().copied())
    }

    fn word(id: &str, text: &str) -> Block {
        Block::new(id, BlockType::Word).with_text(text).with_confidence(99.0)
    }

    fn build(mut blocks: Vec<Block>, options: &ParseOptions) -> Result<Document> {
        blocks.insert(0, Block::new("p1", BlockType::Page).with_page(1));
        Document::from_blocks(blocks, DocumentMetadata::default(), options)
    }

    fn sample() -> Document {
        build(
            vec![
                key("k1", "v1", &["w1"]),
                value("v1", &["w2", "w3"]),
                key("k2", "v2", &["w4"]),
                value("v2", &["w5"]),
                key("k3", "v3", &["w6"]),
                value("v3", &["w7"]),
                word("w1", "Name"),
                word("w2", "Jane"),
                word("w3", "Doe"),
                word("w4", "NAME"),
                word("w5", "J."),
                word("w6", "Name"),
                word("w7", "Smith"),
            ],
            &ParseOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_pairs_keys_with_values() {
        let doc = sample();
        let form = doc.pages()[0].forms()[0];
        assert_eq!(form.len(), 3);

        let field = form.fields()[0];
        assert_eq!(field.key_text(), "Name");
        assert_eq!(field.value_text(), "Jane Doe");
        assert_eq!(field.confidence(), 80.0);
        assert_eq!(field.form().page().number(), 1);
    }

    #[test]
    fn test_search_prefers_exact_matches() {
        let doc = sample();
        let form = doc.pages()[0].forms()[0];

        let exact: Vec<_> = form
            .search_fields_by_key("Name")
            .iter()
            .map(|f| f.value_text())
            .collect();
        assert_eq!(exact, vec!["Jane Doe", "Smith"]);

        let folded: Vec<_> = form
            .search_fields_by_key("name")
            .iter()
            .map(|f| f.value_text())
            .collect();
        assert_eq!(folded, vec!["Jane Doe", "Smith", "J."]);

        assert!(form.search_fields_by_key("Address").is_empty());
    }

    #[test]
    fn test_field_by_key() {
        let doc = sample();
        let form = doc.pages()[0].forms()[0];
        assert_eq!(form.field_by_key("NAME").unwrap().value_text(), "J.");
        assert_eq!(form.field_by_key("nAmE").unwrap().value_text(), "Jane Doe");
        assert!(form.field_by_key("Phone").is_none());
    }

    #[test]
    fn test_value_found_through_child_edge() {
        let doc = build(
            vec![
                Block::new("k1", BlockType::KeyValueSet)
                    .with_entity_type(EntityType::Key)
                    .with_page(1)
                    .with_children(["w1", "v1"]),
                value("v1", &["w2"]),
                word("w1", "City"),
                word("w2", "Oslo"),
            ],
            &ParseOptions::default(),
        )
        .unwrap();
        let form = doc.pages()[0].forms()[0];
        assert_eq!(form.field_by_key("City").unwrap().value_text(), "Oslo");
    }

    #[test]
    fn test_key_value_requires_key_tag() {
        let doc = build(
            vec![value("a", &[]), value("b", &[])],
            &ParseOptions::default(),
        )
        .unwrap();
        let err =
            KeyValueData::new(doc.block("a").unwrap(), doc.block("b").unwrap()).unwrap_err();
        assert!(err.is_structural());
        assert!(matches!(
            err,
            Error::MissingEntityType {
                expected: EntityType::Key,
                ..
            }
        ));
    }

    #[test]
    fn test_mismatched_value_strict_and_lenient() {
        let blocks = vec![
            key("k1", "v1", &["w1"]),
            Block::new("v1", BlockType::KeyValueSet).with_page(1),
            key("k2", "v2", &["w1"]),
            value("v2", &["w2"]),
            word("w1", "Key"),
            word("w2", "ok"),
        ];

        let err = build(blocks.clone(), &ParseOptions::default()).unwrap_err();
        assert!(err.is_structural());

        let doc = build(blocks, &ParseOptions::new().lenient()).unwrap();
        let fields = doc.pages()[0].forms()[0].fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value_text(), "ok");
    }

    #[test]
    fn test_value_that_is_not_a_key_value_set_is_structural() {
        let err = build(
            vec![key("k1", "w1", &[]), word("w1", "stray")],
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedBlockType { .. }));
    }

    #[test]
    fn test_selection_elements() {
        let doc = build(
            vec![
                key("k1", "v1", &["w1"]),
                value("v1", &["s1"]),
                word("w1", "Agree"),
                Block::new("s1", BlockType::SelectionElement)
                    .with_page(1)
                    .with_selection_status("SELECTED"),
                Block::new("s2", BlockType::SelectionElement)
                    .with_page(1)
                    .with_selection_status("NOT_SELECTED"),
            ],
            &ParseOptions::default(),
        )
        .unwrap();
        let form = doc.pages()[0].forms()[0];
        let elements = form.selection_elements();
        assert_eq!(elements.len(), 2);
        assert!(elements[0].is_selected());
        assert!(!elements[1].is_selected());

        let field = form.field_by_key("Agree").unwrap();
        assert!(field.selection_element().unwrap().is_selected());
        assert_eq!(field.value_text(), "");
    }

    #[test]
    fn test_confidence_threshold_drops_pairs() {
        let doc = build(
            vec![
                key("k1", "v1", &["w1"]),
                value("v1", &["w2"]),
                word("w1", "Name"),
                word("w2", "Jane"),
            ],
            &ParseOptions::new().with_confidence_threshold(85.0),
        )
        .unwrap();
        assert!(doc.pages()[0].forms().is_empty());
    }

    #[test]
    fn test_key_without_value_is_skipped() {
        let doc = build(
            vec![
                Block::new("k1", BlockType::KeyValueSet)
                    .with_entity_type(EntityType::Key)
                    .with_page(1)
                    .with_children(["w1"]),
                word("w1", "Lonely"),
            ],
            &ParseOptions::default(),
        )
        .unwrap();
        assert!(doc.pages()[0].forms().is_empty());
    }
}
