//! Integration tests for the document model

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use sitecraft_model::{
    get_by_path, resolve_theme, set_by_path, Block, Document, Theme, TokenMap,
};

#[test]
fn test_set_by_path_leaves_input_alone() {
    let input = json!({ "items": [{ "title": "x" }] });
    let output = set_by_path(&input, "items.0.title", json!("y")).unwrap();

    assert_eq!(output, json!({ "items": [{ "title": "y" }] }));
    assert_eq!(input, json!({ "items": [{ "title": "x" }] }));
}

#[test]
fn test_primary_override() {
    let theme = Theme::default();
    let overrides = TokenMap::from([("primary".to_string(), json!("#111111"))]);
    let effective = resolve_theme(&theme, Some(&overrides));

    assert_eq!(effective.get("primary"), Some(&json!("#111111")));
    for (name, value) in theme.tokens().iter().filter(|(name, _)| name.as_str() != "primary") {
        assert_eq!(effective.get(name), Some(value));
    }
}

#[test]
fn test_hydrate_stored_document() {
    let stored = json!({
        "version": 1,
        "tenantId": "someone-else",
        "meta": { "title": "Acme" },
        "blocks": [
            { "id": "a", "type": "hero", "title": "Hi" },
            { "type": "missing-id" },
            { "id": "a", "type": "text" },
            { "id": "g", "type": "group", "children": [{ "id": "g1", "type": "text" }] }
        ]
    });

    let doc = Document::hydrate(&stored, "acme");

    assert_eq!(doc.top_level_ids(), vec!["a", "g"]);
    assert_eq!(doc.meta.title, "Acme");
    assert!(doc.contains("g1"));
}

#[test]
fn test_block_record_round_trip() {
    let block = Block::new("a", "gallery")
        .with_design("gallery-grid")
        .with_field("images", json!([{ "src": "/1.png" }]));

    let edited = block.set_path("images.0.src", json!("/2.png")).unwrap();

    assert_eq!(edited.get_path("images.0.src"), Some(json!("/2.png")));
    assert_eq!(edited.design_id.as_deref(), Some("gallery-grid"));
    assert_eq!(block.get_path("images.0.src"), Some(json!("/1.png")));
}

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[ -~]{0,10}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn prop_set_then_get(
        path in prop::collection::vec(key(), 1..4),
        value in scalar(),
        existing in scalar(),
    ) {
        let path = path.join(".");
        let root = json!({ "seed": existing });

        let next = set_by_path(&root, &path, value.clone()).unwrap();

        prop_assert_eq!(get_by_path(&next, &path), Some(&value));
        prop_assert_eq!(&root, &json!({ "seed": existing }));
    }
}
