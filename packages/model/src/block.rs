//! # Blocks
//!
//! A block is one content unit of a document. The record has a handful of
//! structural fields (`id`, `type`, `designId`, `style`, `colors`, `children`);
//! everything else is variant-specific content owned by the block's design and
//! kept as raw JSON in `fields`.
//!
//! Children live behind `Arc` so that editing one branch of the tree reuses
//! every other branch by reference.

use crate::path::{get_by_path, segments, set_by_path, PathError};
use crate::theme::TokenMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type BlockId = String;

/// Shallow patch merged into a block record
pub type BlockPatch = Map<String, Value>;

/// Record keys that path edits and patches may not touch
const RESERVED_FIELDS: [&str; 2] = ["id", "children"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,

    /// Category tag (`hero`, `gallery`, ...)
    #[serde(rename = "type")]
    pub block_type: String,

    /// Concrete design within the category. May be stale or missing on old documents.
    #[serde(rename = "designId", default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,

    /// Per-block theme token overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<TokenMap>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Block>>,

    /// Variant-specific content
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            design_id: None,
            style: None,
            colors: None,
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    pub fn with_design(mut self, design_id: impl Into<String>) -> Self {
        self.design_id = Some(design_id.into());
        self
    }

    /// Set a content field. Structural keys have their own builders.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_colors(mut self, colors: TokenMap) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Block>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field as a string slice, for renderers
    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// This block and all of its descendants, depth-first
    pub fn subtree(&self) -> Blocks<'_> {
        Blocks {
            stack: vec![self],
        }
    }

    /// Read a dotted path from the block record
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let record = serde_json::to_value(self).ok()?;
        get_by_path(&record, path).cloned()
    }

    /// Copy of this block with the value at `path` replaced
    pub fn set_path(&self, path: &str, value: Value) -> Result<Block, PathError> {
        self.edit_at(path, |record| set_by_path(record, path, value))
    }

    /// Run a path-addressed edit over the record, refusing reserved roots
    pub fn edit_at(
        &self,
        path: &str,
        edit: impl FnOnce(&Value) -> Result<Value, PathError>,
    ) -> Result<Block, PathError> {
        let head = segments(path)?[0];
        check_writable(head)?;

        self.edit_record(edit)
    }

    /// Copy of this block with `patch` shallow-merged over the record
    pub fn merged(&self, patch: &BlockPatch) -> Result<Block, PathError> {
        for key in patch.keys() {
            check_writable(key)?;
        }

        self.edit_record(|record| {
            let mut record = record.clone();
            if let Value::Object(map) = &mut record {
                map.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(record)
        })
    }

    /// Rewrite the record (minus `id`/`children`) as JSON and read it back.
    ///
    /// Children are carried over by reference.
    pub fn edit_record(
        &self,
        edit: impl FnOnce(&Value) -> Result<Value, PathError>,
    ) -> Result<Block, PathError> {
        let shell = Block {
            children: Vec::new(),
            ..self.clone()
        };
        let record = serde_json::to_value(&shell)?;
        let edited = edit(&record)?;

        let mut block: Block = serde_json::from_value(edited)?;
        block.id = self.id.clone();
        block.children = self.children.clone();
        Ok(block)
    }
}

fn check_writable(key: &str) -> Result<(), PathError> {
    if RESERVED_FIELDS.contains(&key) {
        return Err(PathError::Reserved(key.to_string()));
    }
    Ok(())
}

/// Depth-first, pre-order walk over a block forest
pub struct Blocks<'a> {
    stack: Vec<&'a Block>,
}

impl<'a> Blocks<'a> {
    pub fn new(roots: &'a [Arc<Block>]) -> Self {
        Self {
            stack: roots.iter().rev().map(|b| b.as_ref()).collect(),
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.stack.pop()?;
        self.stack
            .extend(block.children.iter().rev().map(|c| c.as_ref()));
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hero() -> Block {
        Block::new("b1", "hero")
            .with_design("hero-split")
            .with_field("title", json!("Welcome"))
            .with_field("items", json!([{ "label": "One" }]))
    }

    #[test]
    fn test_serializes_flat_record() {
        let value = serde_json::to_value(hero()).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "b1",
                "type": "hero",
                "designId": "hero-split",
                "title": "Welcome",
                "items": [{ "label": "One" }]
            })
        );
    }

    #[test]
    fn test_deserializes_without_design() {
        let block: Block =
            serde_json::from_value(json!({ "id": "x", "type": "text", "body": "hi" })).unwrap();

        assert_eq!(block.design_id, None);
        assert_eq!(block.text("body"), Some("hi"));
    }

    #[test]
    fn test_set_path_into_content() {
        let block = hero();

        let next = block.set_path("items.0.label", json!("Uno")).unwrap();

        assert_eq!(next.field("items"), Some(&json!([{ "label": "Uno" }])));
        assert_eq!(block.field("items"), Some(&json!([{ "label": "One" }])));
    }

    #[test]
    fn test_set_path_into_structural_fields() {
        let next = hero()
            .set_path("colors.primary", json!("#111111"))
            .unwrap()
            .set_path("style.padding", json!(24))
            .unwrap();

        assert_eq!(next.colors.unwrap().get("primary"), Some(&json!("#111111")));
        assert_eq!(next.style.unwrap().get("padding"), Some(&json!(24)));
    }

    #[test]
    fn test_reserved_paths() {
        assert_eq!(
            hero().set_path("id", json!("other")),
            Err(PathError::Reserved("id".to_string()))
        );
        assert!(hero().set_path("children.0", json!({})).is_err());
    }

    #[test]
    fn test_merge_patch() {
        let patch: BlockPatch = serde_json::from_value(json!({
            "title": "Hi",
            "designId": "hero-centered"
        }))
        .unwrap();

        let next = hero().merged(&patch).unwrap();

        assert_eq!(next.text("title"), Some("Hi"));
        assert_eq!(next.design_id.as_deref(), Some("hero-centered"));
        assert_eq!(next.id, "b1");
    }

    #[test]
    fn test_merge_rejects_bad_shape() {
        let patch: BlockPatch = serde_json::from_value(json!({ "type": 5 })).unwrap();
        assert!(matches!(hero().merged(&patch), Err(PathError::Shape(_))));
    }

    #[test]
    fn test_edit_keeps_children_shared() {
        let parent = Block::new("p", "group").with_children([Block::new("c", "text")]);

        let next = parent.set_path("title", json!("Group")).unwrap();

        assert!(Arc::ptr_eq(&parent.children[0], &next.children[0]));
    }

    #[test]
    fn test_subtree_order() {
        let tree = Block::new("a", "group").with_children([
            Block::new("b", "group").with_children([Block::new("c", "text")]),
            Block::new("d", "text"),
        ]);

        let ids: Vec<&str> = tree.subtree().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }
}
