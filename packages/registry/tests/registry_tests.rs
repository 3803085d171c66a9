//! Integration tests for the starter catalog and registry contracts

use proptest::prelude::*;
use serde_json::json;
use sitecraft_model::{resolve_theme, Block, Document, SequentialIds, Theme, TokenMap};
use sitecraft_registry::{starter, FormEdit, Registry};
use std::sync::Arc;

fn registry() -> Registry {
    starter::registry().unwrap()
}

#[test]
fn test_every_default_block_is_valid() {
    let registry = registry();
    let mut ids = SequentialIds::default();

    for design in registry.designs() {
        let block = registry.instantiate(design.design_id(), &mut ids).unwrap();
        let schema = design.schema().unwrap();

        assert_eq!(block.block_type, design.block_type());
        assert!(schema.issues(&block).is_empty(), "{}", design.design_id());
        assert!(!registry.render_block(&block, &Theme::default()).is_placeholder());
    }
}

#[test]
fn test_designs_for_type() {
    let registry = registry();
    let heroes: Vec<&str> = registry.designs_for_type("hero").map(|d| d.design_id()).collect();

    assert_eq!(heroes, ["hero-split", "hero-centered"]);
}

#[test]
fn test_renderers_survive_malformed_fields() {
    let registry = registry();
    let garbage = [json!(null), json!(42), json!("text"), json!([1, 2]), json!({ "a": {} })];

    for design in registry.designs() {
        for value in &garbage {
            let mut block = Block::new("b1", design.block_type()).with_design(design.design_id());
            for field in design.schema().unwrap().fields() {
                block = block.with_field(field.path.clone(), value.clone());
            }

            let node = registry.render_block(&block, &Theme::default());
            assert!(!node.is_placeholder(), "{} with {value}", design.design_id());
        }
    }
}

#[test]
fn test_unknown_design_never_panics() {
    let block = Block::new("b1", "hero").with_design("hero-from-2019");
    let node = registry().render_block(&block, &Theme::default());

    assert!(node.is_placeholder());
}

#[test]
fn test_gallery_list_editing_renders() {
    let registry = registry();
    let mut ids = SequentialIds::default();
    let block = registry.instantiate("gallery-grid", &mut ids).unwrap();
    let schema = registry.schema_for(&block);

    let block = FormEdit::AddItem { path: "images".to_string(), item: None }
        .apply(&block, schema)
        .unwrap();
    let block = FormEdit::Set { path: "images.0.src".to_string(), value: json!("/a.png") }
        .apply(&block, schema)
        .unwrap();
    let block = FormEdit::Set { path: "images.0.caption".to_string(), value: json!("First") }
        .apply(&block, schema)
        .unwrap();

    let node = registry.render_block(&block, &Theme::default());
    assert!(node.text_content().contains("First"));
}

#[test]
fn test_migration_then_render() {
    let mut doc = Document::new("acme");
    doc.version = 1;
    doc.blocks = vec![
        Arc::new(Block::new("a", "hero").with_field("title", json!("Old hero"))),
        Arc::new(Block::new("b", "widget")),
    ];

    let registry = registry();
    let nodes = registry.render_document(&registry.migrate(&doc));

    assert!(!nodes[0].is_placeholder());
    assert!(nodes[1].is_placeholder());
}

fn token_map() -> impl Strategy<Value = TokenMap> {
    prop::collection::btree_map(
        prop::sample::select(vec!["primary", "secondary", "radius", "outline", "custom"])
            .prop_map(str::to_string),
        "#[0-9a-f]{6}".prop_map(serde_json::Value::from),
        0..5,
    )
}

fn block_type() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["hero", "text", "gallery", "widget"]).prop_map(str::to_string)
}

fn legacy_block() -> impl Strategy<Value = (String, bool)> {
    (block_type(), any::<bool>())
}

proptest! {
    #[test]
    fn prop_override_precedence(overrides in token_map()) {
        let theme = Theme::default();
        let effective = resolve_theme(&theme, Some(&overrides));

        for (key, value) in theme.tokens() {
            let expected = overrides.get(key).unwrap_or(value);
            prop_assert_eq!(effective.get(key), Some(expected));
        }
        for (key, value) in &overrides {
            prop_assert_eq!(effective.get(key), Some(value));
        }
    }

    #[test]
    fn prop_migration_idempotent(blocks in prop::collection::vec(legacy_block(), 0..12)) {
        let mut doc = Document::new("acme");
        doc.blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(i, (block_type, with_design))| {
                let block = Block::new(format!("b{i}"), block_type);
                Arc::new(if with_design { block.with_design("custom") } else { block })
            })
            .collect();

        let registry = registry();
        let once = registry.migrate(&doc);
        let twice = registry.migrate(&once);

        prop_assert_eq!(once, twice);
    }
}
