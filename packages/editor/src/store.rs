//! # Document Store
//!
//! Pure, id-addressed operations over the block tree. Every operation returns
//! a new [`Document`] and leaves its input untouched.
//!
//! ```text
//! blocks ─┬─ a ──────────── shared
//!         ├─ b ─┬─ b1 ───── shared
//!         │     └─ b2 ───── replaced   ◀── update_by_id("b2", ..)
//!         └─ c ──────────── shared
//! ```
//!
//! Only the blocks on the path from the root to the edited node are rebuilt;
//! everything else is carried over by `Arc` so history snapshots stay cheap.

use sitecraft_model::{Block, BlockId, BlockPatch, Document, IdGenerator};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a block matched by [`rewrite_where`]
enum Rewrite {
    Keep,
    Replace(Block),
    Remove,
}

/// Walk the forest and rewrite the blocks matching `matches`.
///
/// Returns `None` when nothing changed so callers can keep the original list.
/// Matched blocks are not descended into; their replacement is final.
fn rewrite_where(
    blocks: &[Arc<Block>],
    matches: &dyn Fn(&Block) -> bool,
    edit: &mut dyn FnMut(&Block) -> Rewrite,
) -> Option<Vec<Arc<Block>>> {
    let mut changed = false;
    let mut next = Vec::with_capacity(blocks.len());

    for block in blocks {
        if matches(block) {
            match edit(block) {
                Rewrite::Keep => next.push(Arc::clone(block)),
                Rewrite::Replace(replacement) => {
                    changed = true;
                    next.push(Arc::new(replacement));
                }
                Rewrite::Remove => changed = true,
            }
            continue;
        }

        match rewrite_where(&block.children, matches, edit) {
            Some(children) => {
                changed = true;
                next.push(Arc::new(Block {
                    children,
                    ..(**block).clone()
                }));
            }
            None => next.push(Arc::clone(block)),
        }
    }

    changed.then_some(next)
}

fn with_blocks(doc: &Document, blocks: Option<Vec<Arc<Block>>>) -> Document {
    match blocks {
        Some(blocks) => Document {
            blocks,
            ..doc.clone()
        },
        None => doc.clone(),
    }
}

/// First block with `id` in depth-first document order
pub fn find_by_id<'a>(doc: &'a Document, id: &str) -> Option<&'a Block> {
    doc.iter_blocks().find(|block| block.id == id)
}

/// Shallow-merge `patch` into the block with `id`.
///
/// A patch that does not fit the block (a reserved key, or a value that breaks
/// the record shape) leaves the document unchanged.
pub fn update_by_id(doc: &Document, id: &str, patch: &BlockPatch) -> Document {
    match try_update_by_id(doc, id, |block| block.merged(patch)) {
        Ok(next) => next,
        Err(err) => {
            warn!(block_id = %id, error = %err, "Ignored block patch");
            doc.clone()
        }
    }
}

/// Replace the block with `id` by the result of `edit`, propagating its error
pub fn try_update_by_id<E>(
    doc: &Document,
    id: &str,
    mut edit: impl FnMut(&Block) -> Result<Block, E>,
) -> Result<Document, E> {
    let mut failure = None;
    let matches = |block: &Block| block.id == id;
    let blocks = rewrite_where(&doc.blocks, &matches, &mut |block: &Block| match edit(block) {
        Ok(replacement) => Rewrite::Replace(replacement),
        Err(err) => {
            failure.get_or_insert(err);
            Rewrite::Keep
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(with_blocks(doc, blocks)),
    }
}

/// Drop the block with `id` and its whole subtree, at any depth
pub fn remove_by_id(doc: &Document, id: &str) -> Document {
    let matches = |block: &Block| block.id == id;
    let blocks = rewrite_where(&doc.blocks, &matches, &mut |_: &Block| Rewrite::Remove);
    if blocks.is_some() {
        debug!(block_id = %id, "Removed block");
    }
    with_blocks(doc, blocks)
}

/// Reorder top-level blocks to follow `ordered_ids`.
///
/// Unknown ids are ignored, an id listed twice is placed once, and blocks left
/// out of `ordered_ids` are dropped.
pub fn reorder_top_level(doc: &Document, ordered_ids: &[BlockId]) -> Document {
    let by_id: HashMap<&str, &Arc<Block>> = doc
        .blocks
        .iter()
        .map(|block| (block.id.as_str(), block))
        .collect();
    let mut placed = HashSet::new();

    let blocks = ordered_ids
        .iter()
        .filter(|id| placed.insert(id.as_str()))
        .filter_map(|id| by_id.get(id.as_str()).map(|block| Arc::clone(block)))
        .collect();

    Document {
        blocks,
        ..doc.clone()
    }
}

/// Deep copy of `block` with fresh ids for it and every descendant
pub fn duplicate_subtree(block: &Block, ids: &mut dyn IdGenerator) -> Block {
    let id = ids.next_id(&block.block_type);
    let children = block
        .children
        .iter()
        .map(|child| Arc::new(duplicate_subtree(child, ids)))
        .collect();

    Block {
        id,
        children,
        ..block.clone()
    }
}

/// Append `block` to the end of the top-level list
pub fn add_top_level(doc: &Document, block: Block) -> Document {
    let mut blocks = doc.blocks.clone();
    blocks.push(Arc::new(block));

    Document {
        blocks,
        ..doc.clone()
    }
}

/// Id generator that never hands out an id already present in a document
pub struct FreshIds<'a> {
    inner: &'a mut dyn IdGenerator,
    taken: HashSet<BlockId>,
}

impl<'a> FreshIds<'a> {
    pub fn new(inner: &'a mut dyn IdGenerator, doc: &Document) -> Self {
        Self {
            inner,
            taken: doc.all_ids(),
        }
    }
}

/// Draws from the inner generator before falling back to suffixed ids
const MAX_DRAWS: usize = 32;

impl IdGenerator for FreshIds<'_> {
    fn next_id(&mut self, block_type: &str) -> BlockId {
        let mut last = None;
        for _ in 0..MAX_DRAWS {
            let id = self.inner.next_id(block_type);
            if self.taken.insert(id.clone()) {
                return id;
            }
            debug!(id = %id, "Skipped id already in use");
            last = Some(id);
        }

        // Inner generator keeps repeating itself; `taken` is finite, so this ends
        let base = last.unwrap_or_else(|| block_type.to_string());
        warn!(base = %base, "Id generator exhausted, suffixing");
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|id| !self.taken.contains(id))
            .map(|id| {
                self.taken.insert(id.clone());
                id
            })
            .unwrap_or(base)
    }
}
