//! # Edit Session
//!
//! One editor's view of a document: the undo history, the current selection
//! and the registry used to build new blocks.
//!
//! Every mutating operation goes through the same path:
//!
//! ```text
//! operation ──▶ store (pure) ──▶ History::record ──▶ revision += 1
//! ```
//!
//! Operations addressed by a block id that no longer exists are no-ops and
//! record nothing, so every undo frame corresponds to a visible change.

use crate::errors::EditorError;
use crate::history::History;
use crate::store::{self, FreshIds};
use serde_json::Value;
use sitecraft_model::{
    Block, BlockId, BlockPatch, Document, IdGenerator, Meta, TokenMap, UuidIds,
};
use sitecraft_registry::{FormEdit, Registry};
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct EditSession {
    history: History<Document>,

    /// Currently selected block, always an id present in the document
    selection: Option<BlockId>,

    registry: Arc<Registry>,
    ids: Box<dyn IdGenerator + Send>,

    /// Bumped whenever the present document or the selection changes
    revision: u64,

    /// Bumped whenever the present document changes
    content_revision: u64,
}

impl EditSession {
    /// Session over `document` with production (uuid) ids and unbounded history
    pub fn new(document: Document, registry: Arc<Registry>) -> Self {
        Self::with_ids(document, registry, Box::new(UuidIds))
    }

    pub fn with_ids(
        document: Document,
        registry: Arc<Registry>,
        ids: Box<dyn IdGenerator + Send>,
    ) -> Self {
        Self {
            history: History::new(document),
            selection: None,
            registry,
            ids,
            revision: 0,
            content_revision: 0,
        }
    }

    /// Keep at most `limit` undo levels (`None` = unlimited)
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history = History::with_limit(self.history.present().clone(), limit);
        self
    }

    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn content_revision(&self) -> u64 {
        self.content_revision
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.content_revision += 1;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self, next: Document, action: &'static str) {
        self.history.record(next);
        self.bump();
        debug!(action, revision = self.revision, "Committed edit");
    }

    /// Drop the selection if the block it names is gone
    fn reconcile_selection(&mut self) {
        if let Some(selected) = &self.selection {
            if !self.document().contains(selected) {
                debug!(block_id = %selected, "Selected block no longer exists");
                self.selection = None;
            }
        }
    }

    /// Replace the present with a loaded document, without an undo frame.
    ///
    /// Legacy blocks are given their default designs first.
    #[instrument(skip_all, fields(tenant_id = %document.tenant_id))]
    pub fn hydrate(&mut self, document: Document) {
        let migrated = self.registry.migrate(&document);
        self.history.replace(migrated);
        self.selection = None;
        self.bump();
        debug!(blocks = self.document().blocks.len(), "Hydrated session");
    }

    /// Append a fresh block built by `design_id` and select it
    pub fn add_block(&mut self, design_id: &str) -> Result<BlockId, EditorError> {
        let doc = self.history.present();
        let mut fresh = FreshIds::new(self.ids.as_mut(), doc);
        let block = self
            .registry
            .instantiate(design_id, &mut fresh)
            .ok_or_else(|| EditorError::UnknownDesign(design_id.to_string()))?;

        let id = block.id.clone();
        let next = store::add_top_level(doc, block);
        self.commit(next, "add_block");
        self.selection = Some(id.clone());
        Ok(id)
    }

    /// Remove a block and its subtree. Returns `false` when `id` is unknown.
    pub fn remove_block(&mut self, id: &str) -> bool {
        if !self.document().contains(id) {
            debug!(block_id = %id, "Remove ignored, unknown block");
            return false;
        }

        let next = store::remove_by_id(self.document(), id);
        self.commit(next, "remove_block");
        self.reconcile_selection();
        true
    }

    /// Reorder the top-level blocks. Returns `false` when the order is unchanged.
    pub fn reorder_blocks(&mut self, ordered_ids: &[BlockId]) -> bool {
        let next = store::reorder_top_level(self.document(), ordered_ids);
        if next.top_level_ids() == self.document().top_level_ids() {
            return false;
        }

        self.commit(next, "reorder_blocks");
        self.reconcile_selection();
        true
    }

    /// Copy a block (with fresh ids throughout) to the end of the top-level list
    pub fn duplicate_block(&mut self, id: &str) -> Option<BlockId> {
        let doc = self.history.present();
        let source = store::find_by_id(doc, id)?;
        let mut fresh = FreshIds::new(self.ids.as_mut(), doc);
        let copy = store::duplicate_subtree(source, &mut fresh);

        let copy_id = copy.id.clone();
        let next = store::add_top_level(doc, copy);
        self.commit(next, "duplicate_block");
        self.selection = Some(copy_id.clone());
        Some(copy_id)
    }

    /// Shallow-merge `patch` into a block
    pub fn update_block(&mut self, id: &str, patch: &BlockPatch) -> Result<bool, EditorError> {
        self.edit_block(id, "update_block", |block| Ok(block.merged(patch)?))
    }

    /// Write `value` at a dotted path inside a block, checked against its schema
    pub fn edit_field(&mut self, id: &str, path: &str, value: Value) -> Result<bool, EditorError> {
        let edit = FormEdit::Set {
            path: path.to_string(),
            value,
        };
        self.apply_form_edit(id, &edit)
    }

    /// Apply a schema-driven form edit to a block
    pub fn apply_form_edit(&mut self, id: &str, edit: &FormEdit) -> Result<bool, EditorError> {
        let registry = Arc::clone(&self.registry);
        self.edit_block(id, "form_edit", |block| {
            Ok(edit.apply(block, registry.schema_for(block))?)
        })
    }

    /// Set a block-level theme override
    pub fn set_block_color(&mut self, id: &str, token: &str, value: Value) -> Result<bool, EditorError> {
        self.edit_block(id, "set_block_color", |block| {
            let mut colors = block.colors.clone().unwrap_or_default();
            colors.insert(token.to_string(), value.clone());
            Ok(Block {
                colors: Some(colors),
                ..block.clone()
            })
        })
    }

    /// Drop a block-level override so the document theme shows through again
    pub fn clear_block_color(&mut self, id: &str, token: &str) -> Result<bool, EditorError> {
        let present = store::find_by_id(self.document(), id)
            .and_then(|block| block.colors.as_ref())
            .is_some_and(|colors| colors.contains_key(token));
        if !present {
            return Ok(false);
        }

        self.edit_block(id, "clear_block_color", |block| {
            let colors: TokenMap = block
                .colors
                .iter()
                .flatten()
                .filter(|(name, _)| name.as_str() != token)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            Ok(Block {
                colors: (!colors.is_empty()).then_some(colors),
                ..block.clone()
            })
        })
    }

    fn edit_block(
        &mut self,
        id: &str,
        action: &'static str,
        edit: impl FnMut(&Block) -> Result<Block, EditorError>,
    ) -> Result<bool, EditorError> {
        if !self.document().contains(id) {
            debug!(block_id = %id, action, "Edit ignored, unknown block");
            return Ok(false);
        }

        let next = store::try_update_by_id(self.document(), id, edit)?;
        self.commit(next, action);
        Ok(true)
    }

    /// Set a document-level theme token
    pub fn set_theme_token(&mut self, name: &str, value: Value) {
        let doc = self.document();
        let next = Document {
            theme: doc.theme.with_token(name, value),
            ..doc.clone()
        };
        self.commit(next, "set_theme_token");
    }

    pub fn set_meta(&mut self, meta: Meta) {
        let next = Document {
            meta,
            ..self.document().clone()
        };
        self.commit(next, "set_meta");
    }

    /// Change the selection. Selecting an unknown id is ignored.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        if let Some(id) = id {
            if !self.document().contains(id) {
                debug!(block_id = %id, "Select ignored, unknown block");
                return false;
            }
        }

        if self.selection.as_deref() == id {
            return true;
        }

        self.selection = id.map(str::to_string);
        self.revision += 1;
        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.bump();
        self.reconcile_selection();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.bump();
        self.reconcile_selection();
        true
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("tenant_id", &self.document().tenant_id)
            .field("blocks", &self.document().blocks.len())
            .field("selection", &self.selection)
            .field("undo_levels", &self.history.undo_levels())
            .field("revision", &self.revision)
            .finish()
    }
}
