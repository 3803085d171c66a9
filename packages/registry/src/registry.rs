//! # Block Registry
//!
//! Static lookup from `designId` to the design that owns it, plus the
//! `type → default design` table used when migrating old documents.
//!
//! ## Rendering contract
//!
//! Rendering through the registry never panics:
//! - Unknown or missing `designId` → `RenderNode::Placeholder`
//! - A design whose renderer panics → logged, then `RenderNode::Placeholder`
//!
//! The effective theme for every block is the document theme with the block's
//! `colors` layered on top.

use crate::design::BlockDesign;
use crate::migrate::{migrate_doc, DefaultDesigns};
use crate::render::RenderNode;
use crate::schema::{SchemaDescriptor, SchemaError};
use sitecraft_model::{resolve_theme, Block, Document, IdGenerator, Theme};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Design '{0}' registered twice")]
    DuplicateDesign(String),

    #[error("Design '{design_id}' has an invalid schema: {source}")]
    InvalidSchema {
        design_id: String,
        source: SchemaError,
    },

    #[error("Default design '{design_id}' for type '{block_type}' is not registered")]
    UnknownDefault {
        block_type: String,
        design_id: String,
    },

    #[error("Default design '{design_id}' belongs to type '{actual}', not '{block_type}'")]
    DefaultTypeMismatch {
        block_type: String,
        design_id: String,
        actual: String,
    },
}

/// Immutable design catalog
pub struct Registry {
    designs: Vec<Arc<dyn BlockDesign>>,
    by_id: HashMap<String, usize>,
    defaults: DefaultDesigns,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("designs", &self.by_id.keys().collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with no designs. Every block renders as a placeholder.
    pub fn empty() -> Self {
        Self {
            designs: Vec::new(),
            by_id: HashMap::new(),
            defaults: DefaultDesigns::new(),
        }
    }

    pub fn lookup(&self, design_id: &str) -> Option<&dyn BlockDesign> {
        self.by_id
            .get(design_id)
            .map(|&index| self.designs[index].as_ref())
    }

    /// Design for a block, if its `designId` resolves
    pub fn design_for(&self, block: &Block) -> Option<&dyn BlockDesign> {
        block.design_id.as_deref().and_then(|id| self.lookup(id))
    }

    pub fn schema_for(&self, block: &Block) -> Option<&SchemaDescriptor> {
        self.design_for(block).and_then(|design| design.schema())
    }

    /// All designs in registration order
    pub fn designs(&self) -> impl Iterator<Item = &dyn BlockDesign> {
        self.designs.iter().map(|d| d.as_ref())
    }

    /// Designs offered for one block type, for the block picker
    pub fn designs_for_type<'a>(
        &'a self,
        block_type: &'a str,
    ) -> impl Iterator<Item = &'a dyn BlockDesign> + 'a {
        self.designs().filter(move |d| d.block_type() == block_type)
    }

    pub fn default_design(&self, block_type: &str) -> Option<&str> {
        self.defaults.get(block_type).map(String::as_str)
    }

    pub fn defaults(&self) -> &DefaultDesigns {
        &self.defaults
    }

    /// Build a fresh block from a design's default factory
    pub fn instantiate(&self, design_id: &str, ids: &mut dyn IdGenerator) -> Option<Block> {
        let design = self.lookup(design_id)?;
        let mut block = design.make_default(ids);

        if block.design_id.as_deref() != Some(design_id) {
            block.design_id = Some(design_id.to_string());
        }

        debug!(design_id, block_id = %block.id, "Instantiated block");
        Some(block)
    }

    /// Render one block against the document theme. Never panics.
    pub fn render_block(&self, block: &Block, theme: &Theme) -> RenderNode {
        let Some(design) = self.design_for(block) else {
            debug!(block_id = %block.id, design_id = ?block.design_id, "No design registered, rendering placeholder");
            return RenderNode::placeholder(
                block.id.clone(),
                block.design_id.clone(),
                format!("Unknown design for '{}' block", block.block_type),
            );
        };

        let effective = resolve_theme(theme, block.colors.as_ref());

        match catch_unwind(AssertUnwindSafe(|| design.render(block, &effective))) {
            Ok(node) => node,
            Err(_) => {
                error!(block_id = %block.id, design_id = design.design_id(), "Renderer panicked");
                RenderNode::placeholder(
                    block.id.clone(),
                    block.design_id.clone(),
                    "This block could not be displayed",
                )
            }
        }
    }

    /// Render every top-level block in document order
    pub fn render_document(&self, doc: &Document) -> Vec<RenderNode> {
        doc.blocks
            .iter()
            .map(|block| self.render_block(block, &doc.theme))
            .collect()
    }

    /// Assign default designs to blocks that lack one
    pub fn migrate(&self, doc: &Document) -> Document {
        migrate_doc(doc, &self.defaults)
    }
}

/// Collects designs and defaults, validating them on `build`
#[derive(Default)]
pub struct RegistryBuilder {
    designs: Vec<Arc<dyn BlockDesign>>,
    defaults: DefaultDesigns,
}

impl RegistryBuilder {
    pub fn design(mut self, design: impl BlockDesign + 'static) -> Self {
        self.designs.push(Arc::new(design));
        self
    }

    /// Design assigned by migration to blocks of `block_type` that have none
    pub fn default_design(
        mut self,
        block_type: impl Into<String>,
        design_id: impl Into<String>,
    ) -> Self {
        self.defaults.insert(block_type.into(), design_id.into());
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut by_id = HashMap::with_capacity(self.designs.len());

        for (index, design) in self.designs.iter().enumerate() {
            let design_id = design.design_id().to_string();

            if let Some(schema) = design.schema() {
                schema.validate().map_err(|source| RegistryError::InvalidSchema {
                    design_id: design_id.clone(),
                    source,
                })?;
            }

            if by_id.insert(design_id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateDesign(design_id));
            }
        }

        for (block_type, design_id) in &self.defaults {
            let Some(&index) = by_id.get(design_id) else {
                return Err(RegistryError::UnknownDefault {
                    block_type: block_type.clone(),
                    design_id: design_id.clone(),
                });
            };

            let actual = self.designs[index].block_type();
            if actual != block_type {
                return Err(RegistryError::DefaultTypeMismatch {
                    block_type: block_type.clone(),
                    design_id: design_id.clone(),
                    actual: actual.to_string(),
                });
            }
        }

        info!(
            designs = self.designs.len(),
            defaults = self.defaults.len(),
            "Block registry built"
        );

        Ok(Registry {
            designs: self.designs,
            by_id,
            defaults: self.defaults,
        })
    }
}
