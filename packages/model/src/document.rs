//! # Document
//!
//! Root aggregate for one tenant's site: metadata, theme and the block tree.
//!
//! ## Lifecycle
//!
//! ```text
//! new / hydrate → migrate → edit (snapshots) → persist (debounced)
//! ```
//!
//! Documents are values. Every edit builds a new `Document`; blocks that were
//! not touched are shared with the previous snapshot through `Arc`.

use crate::block::{Block, BlockId, Blocks};
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Schema version written by this crate
pub const CURRENT_VERSION: u32 = 2;

/// Version assumed for documents persisted before versioning existed
const UNVERSIONED: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "unversioned")]
    pub version: u32,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default)]
    pub theme: Theme,

    pub blocks: Vec<Arc<Block>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn unversioned() -> u32 {
    UNVERSIONED
}

impl Document {
    /// Fresh, empty document for a tenant
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            tenant_id: tenant_id.into(),
            meta: Meta::default(),
            theme: Theme::default(),
            blocks: Vec::new(),
            updated_at: None,
        }
    }

    /// Load a persisted document without ever failing.
    ///
    /// A record without a `blocks` array is treated as an empty document.
    /// Blocks that cannot be read, or that reuse an id already seen, are skipped.
    pub fn hydrate(value: &Value, tenant_id: &str) -> Self {
        let Some(record) = value.as_object() else {
            warn!(tenant_id, "Persisted document is not an object, starting empty");
            return Self::new(tenant_id);
        };

        let Some(raw_blocks) = record.get("blocks").and_then(Value::as_array) else {
            warn!(tenant_id, "Persisted document has no blocks, starting empty");
            return Self::new(tenant_id);
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut blocks = Vec::with_capacity(raw_blocks.len());

        for (index, raw) in raw_blocks.iter().enumerate() {
            let block: Block = match serde_json::from_value(raw.clone()) {
                Ok(block) => block,
                Err(e) => {
                    warn!(tenant_id, index, error = %e, "Skipping unreadable block");
                    continue;
                }
            };

            let ids: Vec<&str> = block.subtree().map(|b| b.id.as_str()).collect();
            let unique = ids.iter().collect::<HashSet<_>>().len() == ids.len();
            if !unique || ids.iter().any(|id| seen.contains(*id)) {
                warn!(tenant_id, block_id = %block.id, "Skipping block with duplicate id");
                continue;
            }

            seen.extend(ids.into_iter().map(str::to_string));
            blocks.push(Arc::new(block));
        }

        let field = |key: &str| record.get(key).cloned().unwrap_or(Value::Null);

        Self {
            version: record
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(UNVERSIONED),
            tenant_id: tenant_id.to_string(),
            meta: serde_json::from_value(field("meta")).unwrap_or_default(),
            theme: serde_json::from_value(field("theme")).unwrap_or_default(),
            blocks,
            updated_at: serde_json::from_value(field("updatedAt")).unwrap_or_default(),
        }
    }

    /// Every block in document order, descending into children
    pub fn iter_blocks(&self) -> Blocks<'_> {
        Blocks::new(&self.blocks)
    }

    pub fn all_ids(&self) -> HashSet<BlockId> {
        self.iter_blocks().map(|b| b.id.clone()).collect()
    }

    /// Top-level ids in render order
    pub fn top_level_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.iter_blocks().any(|b| b.id == id)
    }

    /// Copy stamped with a modification time
    pub fn touched(&self, at: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(at),
            ..self.clone()
        }
    }
}
