//! Wire protocol between the editor and the live preview.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```text
//! editor  ──▶ preview   DOCUMENT_SYNC { document, selectedBlockId }
//! preview ──▶ editor    READY
//!                       BLOCK_SELECTED { blockId }
//!                       BLOCK_DELETE_REQUEST { blockId }
//!                       BLOCK_REORDER_REQUEST { orderedIds }
//!                       INLINE_EDIT_REQUEST { blockId, path, value }
//! ```
//!
//! Both directions are closed sets; anything else fails to decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitecraft_model::{BlockId, Document};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Frame is not a JSON object with a string `type`")]
    Untyped,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind} message: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Channel closed")]
    Closed,
}

/// Messages sent by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorMessage {
    /// Full replacement of the preview's state
    #[serde(rename_all = "camelCase")]
    DocumentSync {
        document: Document,
        selected_block_id: Option<BlockId>,
    },
}

/// Messages sent by the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreviewMessage {
    Ready,

    #[serde(rename_all = "camelCase")]
    BlockSelected { block_id: BlockId },

    #[serde(rename_all = "camelCase")]
    BlockDeleteRequest { block_id: BlockId },

    #[serde(rename_all = "camelCase")]
    BlockReorderRequest { ordered_ids: Vec<BlockId> },

    #[serde(rename_all = "camelCase")]
    InlineEditRequest {
        block_id: BlockId,
        path: String,
        value: Value,
    },
}

/// A closed set of wire messages
pub trait Message: Serialize + DeserializeOwned {
    /// Every `type` tag the set accepts
    const TYPES: &'static [&'static str];
}

impl Message for EditorMessage {
    const TYPES: &'static [&'static str] = &["DOCUMENT_SYNC"];
}

impl Message for PreviewMessage {
    const TYPES: &'static [&'static str] = &[
        "READY",
        "BLOCK_SELECTED",
        "BLOCK_DELETE_REQUEST",
        "BLOCK_REORDER_REQUEST",
        "INLINE_EDIT_REQUEST",
    ];
}

pub fn encode<M: Message>(message: &M) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Decode one frame, telling unknown types apart from malformed known ones
pub fn decode<M: Message>(frame: &str) -> Result<M, ProtocolError> {
    let value: Value = serde_json::from_str(frame).map_err(|_| ProtocolError::Untyped)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::Untyped)?
        .to_string();

    if !M::TYPES.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|source| ProtocolError::Invalid { kind, source })
}
