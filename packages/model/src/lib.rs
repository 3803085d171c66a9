//! # Sitecraft Model
//!
//! Serializable document model shared by every Sitecraft layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Document / Block / Theme             │
//! │  - Dotted-path mutation over block records  │
//! │  - Theme token cascade                      │
//! │  - Id generation capability                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ registry: designId → factory/render/schema  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: store + history + persistence       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: editor ⇄ preview message protocol     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots, not deltas**: every edit produces a new `Document`
//! 2. **Structural sharing**: blocks live behind `Arc`, untouched branches are reused
//! 3. **Lenient loading**: malformed persisted data degrades to an empty document
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitecraft_model::{set_by_path, Document};
//! use serde_json::json;
//!
//! let root = json!({ "items": [{ "title": "x" }] });
//! let next = set_by_path(&root, "items.0.title", json!("y"))?;
//! assert_eq!(next, json!({ "items": [{ "title": "y" }] }));
//! ```

mod block;
mod document;
mod ids;
mod path;
mod theme;

pub use block::{Block, BlockId, BlockPatch, Blocks};
pub use document::{Document, Meta, CURRENT_VERSION};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use path::{
    get_by_path, insert_list_item, move_list_item, remove_list_item, set_by_path, ListMove,
    PathError,
};
pub use theme::{resolve_theme, EffectiveTheme, Theme, ThemeToken, TokenMap};
