//! Editor side of the sync channel.
//!
//! The host owns the [`EditSession`]. Requests from the preview and local
//! edits take the same route through the session, and every change is
//! replicated back as a full `DOCUMENT_SYNC`.
//!
//! ```text
//! frame ─▶ decode ─▶ dispatch ─▶ EditSession ─▶ push_state ─▶ DOCUMENT_SYNC
//!            │                                     └─▶ autosave
//!            └─ invalid: logged and dropped
//! ```
//!
//! While [`EditorHost::run`] owns the host, local edits reach it through a
//! [`HostHandle`] and are interleaved with preview requests.

use crate::channel::EditorPort;
use crate::protocol::{decode, EditorMessage, PreviewMessage, ProtocolError};
use sitecraft_editor::{Autosave, EditSession};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

type LocalEdit = Box<dyn FnOnce(&mut EditSession) + Send>;

/// Queues local edits for a host whose loop is running
#[derive(Clone)]
pub struct HostHandle {
    edits: mpsc::UnboundedSender<LocalEdit>,
}

impl HostHandle {
    /// Run `f` against the session inside the host loop and return its result.
    /// Fails with [`ProtocolError::Closed`] once the host has stopped.
    pub async fn edit<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut EditSession) -> R + Send + 'static,
    ) -> Result<R, ProtocolError> {
        let (reply, result) = oneshot::channel();
        self.edits
            .send(Box::new(move |session: &mut EditSession| {
                let _ = reply.send(f(session));
            }))
            .map_err(|_| ProtocolError::Closed)?;
        result.await.map_err(|_| ProtocolError::Closed)
    }
}

pub struct EditorHost {
    session: EditSession,
    port: EditorPort,

    local_tx: mpsc::UnboundedSender<LocalEdit>,
    local_rx: mpsc::UnboundedReceiver<LocalEdit>,

    /// Set by the first READY; nothing is pushed before it
    preview_ready: bool,

    /// Session revision last pushed to the preview
    synced_revision: Option<u64>,

    autosave: Option<Autosave>,

    /// Session content revision last handed to autosave
    saved_revision: u64,
}

impl EditorHost {
    pub fn new(session: EditSession, port: EditorPort) -> Self {
        let saved_revision = session.content_revision();
        let (local_tx, local_rx) = mpsc::unbounded_channel();
        Self {
            session,
            port,
            local_tx,
            local_rx,
            preview_ready: false,
            synced_revision: None,
            autosave: None,
            saved_revision,
        }
    }

    /// Schedule a draft write after every document change
    pub fn with_autosave(mut self, autosave: Autosave) -> Self {
        self.autosave = Some(autosave);
        self
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn preview_ready(&self) -> bool {
        self.preview_ready
    }

    /// Handle for editing the session while [`EditorHost::run`] owns the host
    pub fn handle(&self) -> HostHandle {
        HostHandle {
            edits: self.local_tx.clone(),
        }
    }

    /// Run a local edit against the session, then replicate the result
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditSession) -> R) -> R {
        let result = f(&mut self.session);
        self.after_change();
        result
    }

    /// Decode and apply one inbound frame. Returns `false` if it was dropped.
    #[instrument(skip_all)]
    pub fn handle_frame(&mut self, frame: &str) -> bool {
        let message = match decode::<PreviewMessage>(frame) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "Dropped inbound frame");
                return false;
            }
        };

        self.dispatch(message);
        self.after_change();
        true
    }

    fn dispatch(&mut self, message: PreviewMessage) {
        match message {
            PreviewMessage::Ready => {
                if self.preview_ready {
                    debug!("Preview re-announced readiness");
                }
                self.preview_ready = true;
                // Always answer READY with the current state
                self.synced_revision = None;
            }

            PreviewMessage::BlockSelected { block_id } => {
                self.session.select(Some(&block_id));
            }

            PreviewMessage::BlockDeleteRequest { block_id } => {
                self.session.remove_block(&block_id);
            }

            PreviewMessage::BlockReorderRequest { ordered_ids } => {
                self.session.reorder_blocks(&ordered_ids);
            }

            PreviewMessage::InlineEditRequest {
                block_id,
                path,
                value,
            } => {
                if let Err(err) = self.session.edit_field(&block_id, &path, value) {
                    debug!(block_id = %block_id, path = %path, error = %err, "Rejected inline edit");
                }
            }
        }
    }

    fn after_change(&mut self) {
        if let Some(autosave) = &self.autosave {
            let content = self.session.content_revision();
            if content != self.saved_revision {
                autosave.schedule(self.session.document());
                self.saved_revision = content;
            }
        }

        if let Err(err) = self.push_state() {
            warn!(error = %err, "Failed to push state to preview");
        }
    }

    /// Send `DOCUMENT_SYNC` if the preview is ready and has not seen this revision
    pub fn push_state(&mut self) -> Result<bool, ProtocolError> {
        let revision = self.session.revision();
        if !self.preview_ready || self.synced_revision == Some(revision) {
            return Ok(false);
        }

        self.port.send(&EditorMessage::DocumentSync {
            document: self.session.document().clone(),
            selected_block_id: self.session.selection().map(str::to_string),
        })?;
        self.synced_revision = Some(revision);
        debug!(revision, "Pushed document to preview");
        Ok(true)
    }

    /// Handle every request already queued, without waiting. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(frame) = self.port.try_recv() {
            if self.handle_frame(&frame) {
                applied += 1;
            }
        }
        applied
    }

    /// Serve preview requests and local edits until the preview disconnects,
    /// then flush autosave
    pub async fn run(mut self) -> EditSession {
        info!("Editor host started");
        loop {
            tokio::select! {
                frame = self.port.recv() => match frame {
                    Some(frame) => {
                        self.handle_frame(&frame);
                    }
                    None => break,
                },
                Some(edit) = self.local_rx.recv() => {
                    edit(&mut self.session);
                    self.after_change();
                }
            }
        }

        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await;
        }
        info!("Preview disconnected, editor host stopped");
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::pair;
    use crate::channel::PreviewPort;
    use serde_json::json;
    use sitecraft_model::{Block, Document, SequentialIds};
    use sitecraft_registry::starter;
    use std::sync::Arc;

    fn host() -> (EditorHost, PreviewPort) {
        let mut doc = Document::new("acme");
        doc.blocks = ["a", "b1", "c"]
            .into_iter()
            .map(|id| Arc::new(Block::new(id, "hero").with_design("hero-split")))
            .collect();

        let registry = Arc::new(starter::registry().unwrap());
        let session = EditSession::with_ids(doc, registry, Box::new(SequentialIds::default()));
        let (editor, preview) = pair();
        (EditorHost::new(session, editor), preview)
    }

    fn synced(preview: &mut PreviewPort) -> Option<EditorMessage> {
        preview.latest().map(|frame| decode(&frame).unwrap())
    }

    #[test]
    fn test_nothing_pushed_before_ready() {
        let (mut host, mut preview) = host();
        host.edit(|s| s.remove_block("a"));

        assert!(synced(&mut preview).is_none());
        assert!(host.handle_frame(r#"{"type":"READY"}"#));
        assert!(synced(&mut preview).is_some());
    }

    #[test]
    fn test_duplicate_ready_resends() {
        let (mut host, mut preview) = host();
        host.handle_frame(r#"{"type":"READY"}"#);
        synced(&mut preview).unwrap();

        host.handle_frame(r#"{"type":"READY"}"#);
        assert!(synced(&mut preview).is_some());
    }

    #[test]
    fn test_unchanged_revision_not_resent() {
        let (mut host, mut preview) = host();
        host.handle_frame(r#"{"type":"READY"}"#);
        synced(&mut preview).unwrap();

        host.handle_frame(r#"{"type":"BLOCK_DELETE_REQUEST","blockId":"missing"}"#);
        assert!(synced(&mut preview).is_none());
    }

    #[test]
    fn test_inline_edit_records_frame() {
        let (mut host, mut preview) = host();
        host.handle_frame(r#"{"type":"READY"}"#);
        let levels = host.session().history().undo_levels();

        host.handle_frame(r#"{"type":"INLINE_EDIT_REQUEST","blockId":"b1","path":"title","value":"Hello"}"#);

        assert_eq!(host.session().history().undo_levels(), levels + 1);
        let Some(EditorMessage::DocumentSync { document, .. }) = synced(&mut preview) else {
            panic!("expected DOCUMENT_SYNC");
        };
        assert_eq!(document.blocks[1].text("title"), Some("Hello"));

        host.edit(|s| s.undo());
        assert_eq!(host.session().document().blocks[1].text("title"), None);
    }

    #[test]
    fn test_invalid_frames_dropped() {
        let (mut host, _preview) = host();
        let revision = host.session().revision();

        for frame in [
            "garbage",
            r#"{"type":"NUKE"}"#,
            r#"{"type":"BLOCK_DELETE_REQUEST"}"#,
            r#"{"type":"INLINE_EDIT_REQUEST","blockId":"b1","path":"id","value":"x"}"#,
        ] {
            host.handle_frame(frame);
        }

        assert_eq!(host.session().document().top_level_ids(), vec!["a", "b1", "c"]);
        assert_eq!(host.session().revision(), revision);
        assert!(!host.session().can_undo());
    }

    #[test]
    fn test_selection_is_replicated() {
        let (mut host, mut preview) = host();
        host.handle_frame(r#"{"type":"READY"}"#);
        host.handle_frame(r#"{"type":"BLOCK_SELECTED","blockId":"c"}"#);

        let Some(EditorMessage::DocumentSync { selected_block_id, .. }) = synced(&mut preview) else {
            panic!("expected DOCUMENT_SYNC");
        };
        assert_eq!(selected_block_id.as_deref(), Some("c"));
        assert!(!host.session().can_undo());
    }

    #[tokio::test]
    async fn test_local_edits_while_running() {
        let (host, mut preview) = host();
        let handle = host.handle();
        let task = tokio::spawn(host.run());

        preview.send(&PreviewMessage::Ready).unwrap();
        assert!(handle.edit(|s| s.remove_block("a")).await.unwrap());

        let document = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                let frame = preview.recv().await.unwrap();
                let EditorMessage::DocumentSync { document, .. } =
                    decode::<EditorMessage>(&frame).unwrap();
                if !document.contains("a") {
                    break document;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(document.top_level_ids(), vec!["b1", "c"]);

        drop(preview);
        let session = task.await.unwrap();
        assert!(session.can_undo());
        assert!(matches!(
            handle.edit(|s| s.undo()).await,
            Err(ProtocolError::Closed)
        ));
    }

    #[test]
    fn test_reorder_request() {
        let (mut host, _preview) = host();
        host.handle_frame(&json!({ "type": "BLOCK_REORDER_REQUEST", "orderedIds": ["c", "a", "b1"] }).to_string());

        assert_eq!(host.session().document().top_level_ids(), vec!["c", "a", "b1"]);
    }
}
