//! # Sitecraft Editor
//!
//! Editing engine for sitecraft documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ registry: designId → build / render / form  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Pure id-addressed store operations       │
//! │  - Snapshot undo/redo history               │
//! │  - Selection + revision counter             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: debounced draft writes,        │
//! │ publish, site settings, asset library       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Documents are immutable values**: every edit produces a new snapshot
//! 2. **One mutation path**: local and remote edits both go through the session
//! 3. **Failures stay local**: only storage and network failures reach the user,
//!    as [`Notice`]s
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitecraft_editor::{load_session, EditorConfig, MemoryStorage, Persistence};
//!
//! let config = EditorConfig::load(".")?;
//! let persistence = Persistence::from_config(Arc::new(MemoryStorage::new()), &config, "acme");
//! let mut session = load_session(&persistence, registry, &config).await?;
//!
//! let id = session.add_block("hero-split")?;
//! session.edit_field(&id, "title", json!("Hello"))?;
//! session.undo();
//! ```

mod assets;
mod autosave;
mod config;
mod errors;
mod history;
mod notice;
mod persistence;
mod session;
pub mod store;

pub use assets::{
    resolve_asset_url, Asset, AssetLibrary, AssetStore, ProgressFn, UploadFile, UploadProgress,
};
pub use autosave::Autosave;
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::{AssetError, ConfigError, EditorError, StorageError};
pub use history::History;
pub use notice::{notice_channel, Notice, NoticeLevel, Notices};
pub use persistence::{
    load_session, FileStorage, MemoryStorage, Persistence, SiteSettings, Storage, StorageKeys,
};
pub use session::EditSession;
