use crate::errors::ConfigError;
use crate::persistence::StorageKeys;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "sitecraft.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Prepended to every storage key (`<prefix><tenantId><suffix>`)
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,

    /// Quiet period before a pending draft is written
    #[serde(default = "default_autosave_quiet_period_ms")]
    pub autosave_quiet_period_ms: u64,

    /// Maximum undo levels, unlimited when absent
    #[serde(default)]
    pub history_limit: Option<usize>,

    /// Also write drafts under the pre-split single key
    #[serde(default = "default_write_legacy_key")]
    pub write_legacy_key: bool,

    /// Base for resolving relative asset URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_base_url: Option<String>,
}

fn default_storage_key_prefix() -> String {
    "sitecraft:".to_string()
}

fn default_autosave_quiet_period_ms() -> u64 {
    800
}

fn default_write_legacy_key() -> bool {
    true
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            // Return default config if none exists
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.display().to_string(),
            source,
        })
    }

    pub fn autosave_quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_period_ms)
    }

    pub fn storage_keys(&self, tenant_id: &str) -> StorageKeys {
        StorageKeys::new(&self.storage_key_prefix, tenant_id)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: default_storage_key_prefix(),
            autosave_quiet_period_ms: default_autosave_quiet_period_ms(),
            history_limit: None,
            write_legacy_key: default_write_legacy_key(),
            asset_base_url: None,
        }
    }
}
