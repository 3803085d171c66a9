//! # Persistence
//!
//! Per-tenant document state behind an async key/value [`Storage`].
//!
//! ```text
//! <prefix><tenantId>:draft      work in progress
//! <prefix><tenantId>:published  last published snapshot
//! <prefix><tenantId>:settings   site metadata
//! <prefix><tenantId>            legacy combined record (read fallback, optional write)
//! ```
//!
//! Reads are lenient: a stored value that does not parse loads as an empty
//! document. Writes report failures to the caller, which turns them into
//! notices without interrupting editing.

use crate::config::EditorConfig;
use crate::errors::{EditorError, StorageError};
use crate::session::EditSession;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitecraft_model::Document;
use sitecraft_registry::Registry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
    tenant_id: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}{}{}", self.prefix, self.tenant_id, suffix)
    }

    pub fn draft(&self) -> String {
        self.key(":draft")
    }

    pub fn published(&self) -> String {
        self.key(":published")
    }

    pub fn settings(&self) -> String {
        self.key(":settings")
    }

    pub fn legacy(&self) -> String {
        self.key("")
    }
}

/// Async key/value store holding serialized JSON
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}

/// Site metadata stored next to the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub meta_title: String,

    #[serde(default)]
    pub meta_description: String,
}

/// Record stored under the legacy combined key
#[derive(Debug, Serialize, Deserialize)]
struct LegacyRecord {
    document: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<SiteSettings>,
}

/// Document state of one tenant
#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn Storage>,
    keys: StorageKeys,
    write_legacy_key: bool,
}

impl Persistence {
    pub fn new(storage: Arc<dyn Storage>, keys: StorageKeys) -> Self {
        Self {
            storage,
            keys,
            write_legacy_key: true,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &EditorConfig, tenant_id: &str) -> Self {
        Self {
            write_legacy_key: config.write_legacy_key,
            ..Self::new(storage, config.storage_keys(tenant_id))
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Stored draft, falling back to the legacy key. `None` when neither exists.
    pub async fn load_draft(&self) -> Result<Option<Document>, StorageError> {
        let tenant_id = self.keys.tenant_id();

        if let Some(raw) = self.storage.get(&self.keys.draft()).await? {
            return Ok(Some(Document::hydrate(&parse_lenient(&raw), tenant_id)));
        }

        if let Some(raw) = self.storage.get(&self.keys.legacy()).await? {
            debug!(tenant_id, "Loading draft from legacy key");
            let value = parse_lenient(&raw);
            let document = match serde_json::from_value::<LegacyRecord>(value.clone()) {
                Ok(record) => record.document,
                Err(_) => value,
            };
            return Ok(Some(Document::hydrate(&document, tenant_id)));
        }

        Ok(None)
    }

    /// Write the draft, stamped with the current time
    pub async fn save_draft(&self, doc: &Document) -> Result<(), StorageError> {
        let doc = doc.touched(Utc::now());
        let serialized = serde_json::to_string(&doc)?;
        self.storage.put(&self.keys.draft(), serialized).await?;

        if self.write_legacy_key {
            let record = LegacyRecord {
                document: serde_json::to_value(&doc)?,
                settings: None,
            };
            self.storage
                .put(&self.keys.legacy(), serde_json::to_string(&record)?)
                .await?;
        }

        debug!(tenant_id = self.keys.tenant_id(), blocks = doc.blocks.len(), "Saved draft");
        Ok(())
    }

    /// Snapshot `doc` as the published version
    pub async fn publish(&self, doc: &Document) -> Result<(), StorageError> {
        let doc = doc.touched(Utc::now());
        self.storage
            .put(&self.keys.published(), serde_json::to_string(&doc)?)
            .await?;

        info!(tenant_id = self.keys.tenant_id(), "Published document");
        Ok(())
    }

    pub async fn load_published(&self) -> Result<Option<Document>, StorageError> {
        let raw = self.storage.get(&self.keys.published()).await?;
        Ok(raw.map(|raw| Document::hydrate(&parse_lenient(&raw), self.keys.tenant_id())))
    }

    /// Stored settings, default when absent or unreadable
    pub async fn load_settings(&self) -> Result<SiteSettings, StorageError> {
        let Some(raw) = self.storage.get(&self.keys.settings()).await? else {
            return Ok(SiteSettings::default());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Unreadable site settings, using defaults");
            SiteSettings::default()
        }))
    }

    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<(), StorageError> {
        self.storage
            .put(&self.keys.settings(), serde_json::to_string(settings)?)
            .await
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("keys", &self.keys)
            .field("write_legacy_key", &self.write_legacy_key)
            .finish_non_exhaustive()
    }
}

fn parse_lenient(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(error = %err, "Stored document is not valid JSON");
        Value::Null
    })
}

/// Open an editing session for the stored draft.
///
/// Falls back to the legacy key, then to an empty document. The loaded
/// document is migrated and becomes the present without an undo frame.
#[instrument(skip_all, fields(tenant_id = persistence.keys().tenant_id()))]
pub async fn load_session(
    persistence: &Persistence,
    registry: Arc<Registry>,
    config: &EditorConfig,
) -> Result<EditSession, EditorError> {
    let tenant_id = persistence.keys().tenant_id();
    let document = persistence
        .load_draft()
        .await?
        .unwrap_or_else(|| Document::new(tenant_id));

    let mut session =
        EditSession::new(Document::new(tenant_id), registry).with_history_limit(config.history_limit);
    session.hydrate(document);
    Ok(session)
}
