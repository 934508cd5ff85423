// src/refs/tracker.rs
//! Collection of tracked references from a fetched export.
//!
//! Runs once, after the block tree is complete; the handles it produces
//! stay valid for as long as the tree keeps its shape, which resolution
//! preserves by rewriting fields in place and never moving blocks.

use super::classify;
use crate::model::{
    Block, BlockPath, Page, PropertyKind, PropertyValue, RefLocation, TrackedBlockReference,
};
use crate::types::NotionId;

/// Walk a page's block tree and properties, recording every site that
/// carries a page reference.
pub fn collect_page_refs(page: &Page, blocks: &[Block]) -> Vec<TrackedBlockReference> {
    let mut refs = Vec::new();
    let mut path = Vec::new();
    collect_from_blocks(&page.id, blocks, &mut path, &mut refs);

    let mut property_names: Vec<_> = page
        .properties
        .iter()
        .filter(|(_, value)| property_mentions_page(value))
        .map(|(name, _)| name.clone())
        .collect();
    // HashMap iteration order is arbitrary; keep the output reproducible.
    property_names.sort();
    for name in property_names {
        refs.push(TrackedBlockReference {
            parent_id: page.id.clone(),
            block_id: page.id.clone(),
            location: RefLocation::Property { name },
        });
    }

    refs
}

fn collect_from_blocks(
    parent: &NotionId,
    blocks: &[Block],
    path: &mut Vec<usize>,
    out: &mut Vec<TrackedBlockReference>,
) {
    for (idx, block) in blocks.iter().enumerate() {
        path.push(idx);
        if classify::classify_block(block).is_some() {
            out.push(TrackedBlockReference {
                parent_id: parent.clone(),
                block_id: block.id().clone(),
                location: RefLocation::Block {
                    path: BlockPath::new(path.clone()),
                },
            });
        }
        collect_from_blocks(parent, block.children(), path, out);
        path.pop();
    }
}

fn property_mentions_page(value: &PropertyValue) -> bool {
    let spans = match &value.kind {
        PropertyKind::Title { title } => title,
        PropertyKind::RichText { rich_text } => rich_text,
        _ => return false,
    };
    spans.iter().any(|span| classify::classify_span(span).is_some())
}
