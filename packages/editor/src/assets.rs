//! Asset library.
//!
//! The editor never stores files itself. It keeps a list of `{id, url,
//! filename, size}` entries fetched from an [`AssetStore`] and updates it
//! optimistically; a failed delete puts the entry back where it was.

use crate::errors::AssetError;
use crate::notice::{emit, Notice, Notices};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub size: u64,
}

/// A file selected for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Completed share in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.sent as f64 / self.total as f64).min(1.0)
    }
}

/// Progress callback handed to uploads
pub type ProgressFn<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);

/// Remote asset service
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Assets visible to `owner_id`, or all assets when `None`
    async fn list(&self, owner_id: Option<&str>) -> Result<Vec<Asset>, AssetError>;

    async fn upload(
        &self,
        files: Vec<UploadFile>,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<Asset>, AssetError>;

    async fn delete(&self, id: &str) -> Result<(), AssetError>;
}

/// Absolute URL for `url`, joining relative paths onto `base`
pub fn resolve_asset_url(base: Option<&str>, url: &str) -> String {
    const ABSOLUTE: [&str; 5] = ["http://", "https://", "data:", "blob:", "//"];

    match base {
        Some(base) if !ABSOLUTE.iter().any(|prefix| url.starts_with(prefix)) => {
            format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
        }
        _ => url.to_string(),
    }
}

/// Client-side view of the tenant's assets
#[derive(Debug)]
pub struct AssetLibrary {
    assets: Vec<Asset>,
    notices: Notices,
}

impl AssetLibrary {
    pub fn new(notices: Notices) -> Self {
        Self {
            assets: Vec::new(),
            notices,
        }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Reload the list. On failure the previous list is kept.
    pub async fn refresh(
        &mut self,
        store: &dyn AssetStore,
        owner_id: Option<&str>,
    ) -> Result<(), AssetError> {
        match store.list(owner_id).await {
            Ok(assets) => {
                debug!(count = assets.len(), "Loaded assets");
                self.assets = assets;
                Ok(())
            }
            Err(err) => Err(self.report("Could not load your files", err)),
        }
    }

    /// Upload `files` and prepend the stored assets to the list
    pub async fn upload(
        &mut self,
        store: &dyn AssetStore,
        files: Vec<UploadFile>,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<Asset>, AssetError> {
        match store.upload(files, progress).await {
            Ok(uploaded) => {
                debug!(count = uploaded.len(), "Uploaded assets");
                self.assets.splice(0..0, uploaded.iter().cloned());
                Ok(uploaded)
            }
            Err(err) => Err(self.report("Upload failed", err)),
        }
    }

    /// Remove an asset, restoring it if the store refuses.
    ///
    /// Returns `Ok(false)` when the asset is not in the list.
    pub async fn delete(&mut self, store: &dyn AssetStore, id: &str) -> Result<bool, AssetError> {
        let Some(index) = self.assets.iter().position(|asset| asset.id == id) else {
            return Ok(false);
        };

        let removed = self.assets.remove(index);

        if let Err(err) = store.delete(id).await {
            let index = index.min(self.assets.len());
            self.assets.insert(index, removed);
            return Err(self.report("Could not delete the file", err));
        }

        debug!(asset_id = %id, "Deleted asset");
        Ok(true)
    }

    fn report(&self, summary: &str, err: AssetError) -> AssetError {
        warn!(error = %err, "{summary}");
        emit(&self.notices, Notice::error(format!("{summary}: {err}")));
        err
    }
}
