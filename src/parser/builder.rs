//! Two-pass document build: index, resolve, assemble.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{
    Block, BlockRef, BlockType, Document, DocumentMetadata, Link, PageData, RelationshipType,
};

use super::options::ParseOptions;
use super::raw::RawDocument;

/// Build a document from one decoded wire unit.
pub(crate) fn from_raw(raw: RawDocument, options: &ParseOptions) -> Result<Document> {
    let metadata = DocumentMetadata {
        pages: raw.declared_pages(),
        model_version: raw.model_version,
    };

    let mut blocks = Vec::with_capacity(raw.blocks.len());
    for (i, record) in raw.blocks.into_iter().enumerate() {
        match record {
            Some(record) => blocks.push(Block::from(record)),
            None if options.is_lenient() => log::warn!("Skipping null block record at {}", i),
            None => return Err(Error::NullBlock(i)),
        }
    }

    build(blocks, metadata, options)
}

/// Build a document from blocks.
pub(crate) fn build(
    mut blocks: Vec<Block>,
    metadata: DocumentMetadata,
    options: &ParseOptions,
) -> Result<Document> {
    let index = index_blocks(&blocks);
    resolve_relationships(&mut blocks, &index);

    let mut doc = Document::indexed(metadata, blocks, index);
    let pages = assemble_pages(&doc, options)?;
    doc.set_pages(pages);

    log::debug!(
        "Built document with {} blocks and {} pages",
        doc.block_count(),
        doc.pages().len()
    );
    Ok(doc)
}

/// Pass 1: id -> arena index. The first occurrence of an id wins.
fn index_blocks(blocks: &[Block]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        if block.id.is_empty() {
            log::debug!("Block at {} has no id and cannot be referenced", i);
            continue;
        }
        match index.entry(block.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(_) => log::warn!("Duplicate block id {}, keeping the first", block.id),
        }
    }
    index
}

/// Pass 2: turn id edges into arena edges and fill CHILD parents.
fn resolve_relationships(blocks: &mut [Block], index: &HashMap<String, usize>) {
    let mut links: Vec<Vec<Link>> = Vec::with_capacity(blocks.len());
    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];

    for (i, block) in blocks.iter().enumerate() {
        let mut resolved = Vec::with_capacity(block.relationships.len());
        for relationship in &block.relationships {
            let targets: Vec<usize> = relationship
                .ids
                .iter()
                .filter_map(|id| {
                    let target = index.get(id).copied();
                    if target.is_none() {
                        log::debug!(
                            "Dropping dangling {} edge {} -> {}",
                            relationship.kind,
                            block.id,
                            id
                        );
                    }
                    target
                })
                .collect();

            if relationship.kind == RelationshipType::Child {
                for &target in &targets {
                    parents[target].push(i);
                }
            }
            resolved.push(Link {
                kind: relationship.kind.clone(),
                targets,
            });
        }
        links.push(resolved);
    }

    for ((block, links), parents) in blocks.iter_mut().zip(links).zip(parents) {
        block.links = links;
        block.parents = parents;
    }
}

/// PAGE blocks in page-number order (stable), each assembled into a page.
///
/// Pages without a declared number are numbered after the highest declared
/// one, in input order.
fn assemble_pages(doc: &Document, options: &ParseOptions) -> Result<Vec<PageData>> {
    let page_blocks: Vec<BlockRef<'_>> = doc
        .blocks()
        .filter(|block| block.block_type == BlockType::Page)
        .collect();

    let mut next = page_blocks.iter().map(|block| block.page).max().unwrap_or(0);
    let mut numbered: Vec<(u32, BlockRef<'_>)> = page_blocks
        .into_iter()
        .map(|block| {
            if block.page > 0 {
                (block.page, block)
            } else {
                next = next.saturating_add(1);
                log::debug!("Page {} has no page number, using {}", block.id, next);
                (next, block)
            }
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);

    numbered
        .into_iter()
        .map(|(number, block)| PageData::build(block, number, options))
        .collect()
}
