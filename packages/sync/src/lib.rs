//! # Sitecraft Sync
//!
//! Message passing between the editor and the live preview.
//!
//! ```text
//! ┌──────────────┐   DOCUMENT_SYNC (latest wins)   ┌─────────────────┐
//! │  EditorHost  │ ──────────────────────────────▶ │ PreviewRenderer │
//! │ EditSession  │ ◀────────────────────────────── │  RenderNodes    │
//! └──────────────┘   READY / *_REQUEST (FIFO)      └─────────────────┘
//! ```
//!
//! The two sides share nothing but JSON frames. The editor is authoritative:
//! the preview may mirror deletes and reorders optimistically, and every
//! `DOCUMENT_SYNC` overwrites its state wholesale.

pub mod autoscroll;
pub mod channel;
mod host;
mod preview;
mod protocol;

pub use autoscroll::{AutoScroll, Viewport};
pub use channel::{pair, EditorPort, PreviewPort};
pub use host::{EditorHost, HostHandle};
pub use preview::PreviewRenderer;
pub use protocol::{decode, encode, EditorMessage, Message, PreviewMessage, ProtocolError};
