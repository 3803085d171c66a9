//! User-visible failure notices.
//!
//! Only storage and network bound operations report to the user. They do so by
//! broadcasting a [`Notice`]; editing carries on regardless.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Broadcast sender for notices
pub type Notices = broadcast::Sender<Notice>;

/// Notice channel with room for `capacity` unread notices per subscriber
pub fn notice_channel(capacity: usize) -> (Notices, broadcast::Receiver<Notice>) {
    broadcast::channel(capacity)
}

/// Send without caring whether anyone is listening
pub(crate) fn emit(notices: &Notices, notice: Notice) {
    if notices.send(notice).is_err() {
        debug!("Notice dropped, no subscribers");
    }
}
