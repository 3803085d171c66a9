//! Preview side of the sync channel.
//!
//! The preview renders whatever the editor last sent. Deletes and reorders
//! are mirrored locally straight away so drags feel immediate; the next
//! `DOCUMENT_SYNC` overwrites that mirror, including undoing it when the
//! editor ignored the request.

use crate::channel::PreviewPort;
use crate::protocol::{decode, EditorMessage, PreviewMessage, ProtocolError};
use serde_json::Value;
use sitecraft_editor::store;
use sitecraft_model::{BlockId, Document};
use sitecraft_registry::{Registry, RenderNode};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct PreviewRenderer {
    port: PreviewPort,
    registry: Arc<Registry>,

    /// `None` until the first sync arrives
    document: Option<Document>,
    selected: Option<BlockId>,
}

impl PreviewRenderer {
    pub fn new(port: PreviewPort, registry: Arc<Registry>) -> Self {
        Self {
            port,
            registry,
            document: None,
            selected: None,
        }
    }

    /// Announce readiness to the editor
    pub fn mount(&self) -> Result<(), ProtocolError> {
        self.port.send(&PreviewMessage::Ready)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Replace local state with an editor frame. Returns `false` if it was dropped.
    #[instrument(skip_all)]
    pub fn apply_frame(&mut self, frame: &str) -> bool {
        match decode::<EditorMessage>(frame) {
            Ok(EditorMessage::DocumentSync {
                document,
                selected_block_id,
            }) => {
                debug!(blocks = document.blocks.len(), "Applied document sync");
                self.document = Some(document);
                self.selected = selected_block_id;
                true
            }
            Err(err) => {
                debug!(error = %err, "Dropped editor frame");
                false
            }
        }
    }

    /// Apply the newest pending frame, if any
    pub fn poll(&mut self) -> bool {
        match self.port.latest() {
            Some(frame) => self.apply_frame(&frame),
            None => false,
        }
    }

    pub fn select(&self, block_id: &str) -> Result<(), ProtocolError> {
        self.port.send(&PreviewMessage::BlockSelected {
            block_id: block_id.to_string(),
        })
    }

    /// Remove the block locally and ask the editor to do the same
    pub fn request_delete(&mut self, block_id: &str) -> Result<(), ProtocolError> {
        if let Some(document) = &self.document {
            self.document = Some(store::remove_by_id(document, block_id));
        }

        self.port.send(&PreviewMessage::BlockDeleteRequest {
            block_id: block_id.to_string(),
        })
    }

    /// Reorder locally and ask the editor to do the same
    pub fn request_reorder(&mut self, ordered_ids: Vec<BlockId>) -> Result<(), ProtocolError> {
        if let Some(document) = &self.document {
            self.document = Some(store::reorder_top_level(document, &ordered_ids));
        }

        self.port.send(&PreviewMessage::BlockReorderRequest { ordered_ids })
    }

    /// Ask the editor to apply an in-place edit. Nothing changes locally until it syncs back.
    pub fn request_inline_edit(
        &self,
        block_id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), ProtocolError> {
        self.port.send(&PreviewMessage::InlineEditRequest {
            block_id: block_id.to_string(),
            path: path.to_string(),
            value,
        })
    }

    /// One node per top-level block, the selected one marked
    pub fn render(&self) -> Vec<RenderNode> {
        let Some(document) = &self.document else {
            return Vec::new();
        };

        document
            .blocks
            .iter()
            .map(|block| {
                let node = self.registry.render_block(block, &document.theme);
                if self.selected.as_deref() != Some(block.id.as_str()) {
                    return node;
                }

                // Placeholders carry no attributes, so wrap them to mark the selection
                let node = if node.is_placeholder() {
                    RenderNode::element("div")
                        .with_attr("data-block-id", block.id.as_str())
                        .with_child(node)
                } else {
                    node
                };
                node.with_attr("data-selected", "true")
            })
            .collect()
    }

    /// Wait for the next editor frame and apply it. `false` once the editor is gone.
    pub async fn next_frame(&mut self) -> bool {
        match self.port.recv().await {
            Some(frame) => {
                self.apply_frame(&frame);
                true
            }
            None => false,
        }
    }

    /// Apply editor frames until the editor goes away
    pub async fn run(&mut self) {
        info!("Preview renderer started");
        while self.next_frame().await {}
        info!("Editor disconnected, preview renderer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::pair;
    use crate::protocol::encode;
    use sitecraft_model::Block;
    use sitecraft_registry::starter;

    fn frame(ids: &[&str], selected: Option<&str>) -> String {
        let mut document = Document::new("acme");
        document.blocks = ids
            .iter()
            .map(|id| Arc::new(Block::new(*id, "text").with_design("text-basic")))
            .collect();
        encode(&EditorMessage::DocumentSync {
            document,
            selected_block_id: selected.map(str::to_string),
        })
        .unwrap()
    }

    fn renderer() -> PreviewRenderer {
        let (_editor, preview) = pair();
        PreviewRenderer::new(preview, Arc::new(starter::registry().unwrap()))
    }

    fn ids(renderer: &PreviewRenderer) -> Vec<String> {
        renderer.document().unwrap().top_level_ids()
    }

    #[test]
    fn test_sync_replaces_state() {
        let mut renderer = renderer();
        assert!(renderer.render().is_empty());

        assert!(renderer.apply_frame(&frame(&["a", "b"], Some("b"))));
        assert_eq!(ids(&renderer), vec!["a", "b"]);
        assert_eq!(renderer.selected(), Some("b"));

        let nodes = renderer.render();
        assert_eq!(nodes[1].attr("data-selected"), Some("true"));
        assert_eq!(nodes[0].attr("data-selected"), None);
    }

    #[test]
    fn test_selected_placeholder_is_marked() {
        let mut document = Document::new("acme");
        document.blocks = vec![
            Arc::new(Block::new("a", "text").with_design("text-basic")),
            Arc::new(Block::new("b", "mystery").with_design("no-such-design")),
        ];
        let frame = encode(&EditorMessage::DocumentSync {
            document,
            selected_block_id: Some("b".to_string()),
        })
        .unwrap();

        let mut renderer = renderer();
        renderer.apply_frame(&frame);
        let nodes = renderer.render();

        assert_eq!(nodes[1].attr("data-selected"), Some("true"));
        assert_eq!(nodes[1].attr("data-block-id"), Some("b"));
        assert!(nodes[1].children()[0].is_placeholder());
        assert_eq!(nodes[0].attr("data-selected"), None);
    }

    #[test]
    fn test_optimistic_mirror_is_overwritten() {
        let mut renderer = renderer();
        renderer.apply_frame(&frame(&["a", "b", "c"], None));

        let _ = renderer.request_reorder(vec!["c".into(), "b".into(), "a".into()]);
        let _ = renderer.request_delete("b");
        assert_eq!(ids(&renderer), vec!["c", "a"]);

        // Editor ignored both requests
        renderer.apply_frame(&frame(&["a", "b", "c"], None));
        assert_eq!(ids(&renderer), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bad_frames_keep_state() {
        let mut renderer = renderer();
        renderer.apply_frame(&frame(&["a"], None));

        assert!(!renderer.apply_frame("{}"));
        assert!(!renderer.apply_frame(r#"{"type":"DOCUMENT_SYNC"}"#));
        assert!(!renderer.apply_frame(r#"{"type":"READY"}"#));
        assert_eq!(ids(&renderer), vec!["a"]);
    }
}
