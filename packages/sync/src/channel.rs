//! In-process transport linking one editor and one preview.
//!
//! ```text
//!            watch (latest wins)
//! EditorPort ───────────────────▶ PreviewPort
//!            ◀───────────────────
//!            mpsc (FIFO)
//! ```
//!
//! The editor only ever replicates whole state, so an unread frame is simply
//! replaced by a newer one. Requests from the preview are queued in order.

use crate::protocol::{encode, EditorMessage, PreviewMessage, ProtocolError};
use tokio::sync::{mpsc, watch};

/// Create a connected pair of ports
pub fn pair() -> (EditorPort, PreviewPort) {
    let (state_tx, state_rx) = watch::channel(None);
    let (request_tx, request_rx) = mpsc::unbounded_channel();

    (
        EditorPort {
            outbound: state_tx,
            inbound: request_rx,
        },
        PreviewPort {
            inbound: state_rx,
            outbound: request_tx,
        },
    )
}

#[derive(Debug)]
pub struct EditorPort {
    outbound: watch::Sender<Option<String>>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl EditorPort {
    pub fn send(&self, message: &EditorMessage) -> Result<(), ProtocolError> {
        self.outbound.send_replace(Some(encode(message)?));
        Ok(())
    }

    /// Next request frame. `None` once the preview side is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Next request frame if one is already queued
    pub fn try_recv(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }
}

#[derive(Debug)]
pub struct PreviewPort {
    inbound: watch::Receiver<Option<String>>,
    outbound: mpsc::UnboundedSender<String>,
}

impl PreviewPort {
    pub fn send(&self, message: &PreviewMessage) -> Result<(), ProtocolError> {
        self.send_frame(encode(message)?)
    }

    /// Send a raw frame as-is
    pub fn send_frame(&self, frame: String) -> Result<(), ProtocolError> {
        self.outbound.send(frame).map_err(|_| ProtocolError::Closed)
    }

    /// Wait for the next state frame. `None` once the editor side is gone.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            self.inbound.changed().await.ok()?;
            let frame = self.inbound.borrow_and_update().clone();
            if frame.is_some() {
                return frame;
            }
        }
    }

    /// Latest unread state frame, without waiting
    pub fn latest(&mut self) -> Option<String> {
        if !self.inbound.has_changed().unwrap_or(false) {
            return None;
        }
        self.inbound.borrow_and_update().clone()
    }
}
