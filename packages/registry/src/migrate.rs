//! Document migration.
//!
//! Documents written before designs existed carry only a `type`. Migration
//! assigns each such block the default design for its type. Blocks that already
//! name a design are left alone, which makes the pass idempotent.

use sitecraft_model::{Block, Document, CURRENT_VERSION};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Block type → default design id
pub type DefaultDesigns = HashMap<String, String>;

/// Assign default designs to blocks that lack one, anywhere in the tree
pub fn migrate_doc(doc: &Document, defaults: &DefaultDesigns) -> Document {
    let blocks = migrate_blocks(&doc.blocks, defaults).unwrap_or_else(|| doc.blocks.clone());

    Document {
        version: doc.version.max(CURRENT_VERSION),
        blocks,
        ..doc.clone()
    }
}

/// `None` when nothing in `blocks` changed, so callers can keep the original list
fn migrate_blocks(blocks: &[Arc<Block>], defaults: &DefaultDesigns) -> Option<Vec<Arc<Block>>> {
    let mut changed = false;

    let next: Vec<Arc<Block>> = blocks
        .iter()
        .map(|block| match migrate_block(block, defaults) {
            Some(migrated) => {
                changed = true;
                Arc::new(migrated)
            }
            None => Arc::clone(block),
        })
        .collect();

    changed.then_some(next)
}

fn migrate_block(block: &Block, defaults: &DefaultDesigns) -> Option<Block> {
    let children = migrate_blocks(&block.children, defaults);

    let missing_design = block.design_id.as_deref().map_or(true, str::is_empty);
    let design_id = if missing_design {
        defaults.get(&block.block_type).cloned()
    } else {
        None
    };

    if children.is_none() && design_id.is_none() {
        return None;
    }

    let mut migrated = block.clone();
    if let Some(children) = children {
        migrated.children = children;
    }
    if let Some(design_id) = design_id {
        debug!(block_id = %block.id, design_id = %design_id, "Assigned default design");
        migrated.design_id = Some(design_id);
    }

    Some(migrated)
}
