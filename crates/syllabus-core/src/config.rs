use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use syllabus_util::errors::SyllabusError;
use syllabus_util::fs::{expand_tilde, home_dir};

use crate::topic::OwnerId;

/// Global user configuration loaded from `~/.syllabus/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    /// Owner used when none is given on the command line.
    #[serde(default, rename = "default-owner")]
    pub default_owner: Option<String>,
}

/// Store settings from `[store]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "~/.syllabus/topics.toml".to_string()
}

/// How mutations treat prerequisite edges that would close a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Accept the edge; cycles surface the next time an order is computed.
    #[default]
    Lazy,
    /// Refuse any edge that would make the subject graph cyclic.
    Reject,
}

/// Graph engine settings from `[graph]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default, rename = "cycle-policy")]
    pub cycle_policy: CyclePolicy,
    /// Keep computed study orders per owner until that owner's next mutation.
    #[serde(default, rename = "cache-orders")]
    pub cache_orders: bool,
}

impl GlobalConfig {
    /// Load the global configuration from `~/.syllabus/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, returning defaults when it is absent.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| SyllabusError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            SyllabusError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The store file location with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        expand_tilde(&self.store.path, &home_dir())
    }

    /// Pick the acting owner: explicit flag, then `default-owner`, then `$USER`.
    pub fn resolve_owner(&self, explicit: Option<&str>) -> OwnerId {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_owner.clone())
            .or_else(|| std::env::var("USER").ok())
            .filter(|o| !o.trim().is_empty())
            .map(OwnerId::from)
            .unwrap_or_else(|| OwnerId::from("default"))
    }
}

/// Returns the path to the Syllabus data directory (`~/.syllabus/`).
pub fn dirs_path() -> PathBuf {
    home_dir().join(".syllabus")
}
