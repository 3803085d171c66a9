//! Integration tests for editor crate

use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::json;
use sitecraft_editor::{
    load_session, store, Autosave, EditSession, EditorConfig, FileStorage, MemoryStorage,
    Persistence, Storage, StorageKeys,
};
use sitecraft_model::{Block, Document, SequentialIds};
use sitecraft_registry::{starter, FormEdit, Registry};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> Arc<Registry> {
    Arc::new(starter::registry().unwrap())
}

fn session(doc: Document) -> EditSession {
    EditSession::with_ids(doc, registry(), Box::new(SequentialIds::default()))
}

fn abc() -> Document {
    let mut doc = Document::new("acme");
    doc.blocks = ["a", "b", "c"]
        .into_iter()
        .map(|id| Arc::new(Block::new(id, "text").with_design("text-basic")))
        .collect();
    doc
}

#[test]
fn test_add_undo_redo_keeps_block_id() {
    let mut session = session(Document::new("acme"));
    assert!(session.document().blocks.is_empty());

    session.add_block("hero-split").unwrap();
    assert_eq!(session.document().blocks.len(), 1);
    let id = session.document().blocks[0].id.clone();

    assert!(session.undo());
    assert_eq!(session.document().blocks.len(), 0);

    assert!(session.redo());
    assert_eq!(session.document().blocks.len(), 1);
    assert_eq!(session.document().blocks[0].id, id);
}

#[test]
fn test_cleared_color_falls_back_to_theme() {
    let mut session = session(Document::new("acme"));
    let id = session.add_block("hero-centered").unwrap();
    let background = |session: &EditSession| {
        let block = store::find_by_id(session.document(), &id).unwrap();
        session
            .registry()
            .render_block(block, &session.document().theme)
            .style("background")
            .map(str::to_string)
    };

    assert!(session
        .edit_field(&id, "colors.sectionBackground", json!("#123456"))
        .unwrap());
    assert_eq!(background(&session).as_deref(), Some("#123456"));

    assert!(session
        .edit_field(&id, "colors.sectionBackground", serde_json::Value::Null)
        .unwrap());
    assert_eq!(background(&session).as_deref(), Some("#f8fafc"));
}

#[test]
fn test_reorder_three_blocks() {
    let order: Vec<String> = ["c", "a", "b"].iter().map(|s| s.to_string()).collect();
    let next = store::reorder_top_level(&abc(), &order);

    assert_eq!(next.top_level_ids(), order);
}

#[test]
fn test_edit_session_workflow() {
    let mut session = session(abc());

    let copy = session.duplicate_block("b").unwrap();
    assert_eq!(session.document().top_level_ids().last(), Some(&copy));
    assert_eq!(session.selection(), Some(copy.as_str()));

    session.edit_field("a", "heading", json!("Welcome")).unwrap();
    session
        .apply_form_edit("a", &FormEdit::Set { path: "align".to_string(), value: json!("center") })
        .unwrap();

    let a = store::find_by_id(session.document(), "a").unwrap();
    assert_eq!(a.text("heading"), Some("Welcome"));
    assert_eq!(a.text("align"), Some("center"));

    let ids: Vec<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
    assert!(session.reorder_blocks(&ids));
    assert_eq!(session.selection(), None);

    while session.undo() {}
    assert_eq!(session.document(), &abc());
}

#[test]
fn test_gallery_list_editing() {
    let mut session = session(Document::new("acme"));
    let id = session.add_block("gallery-grid").unwrap();

    for src in ["/1.png", "/2.png"] {
        session
            .apply_form_edit(&id, &FormEdit::AddItem { path: "images".to_string(), item: None })
            .unwrap();
        let index = session.document().blocks[0].field("images").unwrap().as_array().unwrap().len() - 1;
        session.edit_field(&id, &format!("images.{index}.src"), json!(src)).unwrap();
    }

    session
        .apply_form_edit(
            &id,
            &FormEdit::MoveItem {
                path: "images".to_string(),
                index: 1,
                direction: sitecraft_model::ListMove::Up,
            },
        )
        .unwrap();

    let images = session.document().blocks[0].field("images").cloned().unwrap();
    assert_eq!(images, json!([{ "src": "/2.png", "caption": "" }, { "src": "/1.png", "caption": "" }]));
}

#[tokio::test]
async fn test_load_session_from_files() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()));
    let config = EditorConfig::default();
    let persistence = Persistence::from_config(storage.clone(), &config, "acme");

    let legacy = json!({ "blocks": [{ "id": "h", "type": "hero", "title": "Old" }] });
    storage.put(&persistence.keys().draft(), legacy.to_string()).await?;

    let mut session = load_session(&persistence, registry(), &config).await?;
    assert_eq!(session.document().blocks[0].design_id.as_deref(), Some("hero-split"));
    assert!(!session.can_undo());

    session.edit_field("h", "title", json!("New"))?;
    persistence.save_draft(session.document()).await?;
    persistence.publish(session.document()).await?;

    let published = persistence.load_published().await?.unwrap();
    assert_eq!(store::find_by_id(&published, "h").unwrap().text("title"), Some("New"));
    Ok(())
}

#[tokio::test]
async fn test_load_session_without_draft() -> Result<()> {
    let persistence = Persistence::new(Arc::new(MemoryStorage::new()), StorageKeys::new("sc:", "acme"));
    let session = load_session(&persistence, registry(), &EditorConfig::default()).await?;

    assert!(session.document().blocks.is_empty());
    assert_eq!(session.document().tenant_id, "acme");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_autosave_follows_session() -> Result<()> {
    init_tracing();
    let persistence = Persistence::new(Arc::new(MemoryStorage::new()), StorageKeys::new("sc:", "acme"));
    let (notices, _rx) = sitecraft_editor::notice_channel(8);
    let autosave = Autosave::spawn(persistence.clone(), Duration::from_millis(800), notices);
    let mut session = session(Document::new("acme"));

    for _ in 0..3 {
        session.add_block("text-basic")?;
        autosave.schedule(session.document());
    }
    assert_eq!(session.history().undo_levels(), 3);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let saved = persistence.load_draft().await?.unwrap();
    assert_eq!(saved.blocks.len(), 3);

    autosave.shutdown().await;
    Ok(())
}
