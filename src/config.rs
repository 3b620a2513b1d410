use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gate::DEFAULT_ADMIN_ROLE;

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_true() -> bool {
    true
}

fn default_admin_role() -> String {
    DEFAULT_ADMIN_ROLE.to_string()
}

/// Backend connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset means the HTTP client's own defaults apply
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

/// Where the session key/value file lives
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Role literal that unlocks the management pages
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_role: default_admin_role(),
        }
    }
}

/// One config file as written on disk. Every field is optional so a layer
/// only overrides what it mentions.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    api: Option<ApiLayer>,
    #[serde(default)]
    storage: Option<StorageConfig>,
    #[serde(default)]
    journal: Option<JournalLayer>,
    #[serde(default)]
    auth: Option<AuthLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApiLayer {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JournalLayer {
    enabled: Option<bool>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AuthLayer {
    admin_role: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub journal: JournalConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.userdesk/config.local.toml) > project (.userdesk/config.toml)
    /// > user (~/.userdesk/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".userdesk").join("config.toml");
            if user_config.exists() {
                config.merge_file(&user_config)?;
            }
        }

        let project_config = Path::new(".userdesk").join("config.toml");
        if project_config.exists() {
            config.merge_file(&project_config)?;
        }

        // Should be gitignored
        let local_config = Path::new(".userdesk").join("config.local.toml");
        if local_config.exists() {
            config.merge_file(&local_config)?;
        }

        Ok(config)
    }

    /// Load configuration from a specific path over the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let layer: ConfigLayer = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        self.merge(layer);
        Ok(())
    }

    /// Merge a layer into this config (layer takes priority where set)
    fn merge(&mut self, other: ConfigLayer) {
        if let Some(api) = other.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if api.timeout_ms.is_some() {
                self.api.timeout_ms = api.timeout_ms;
            }
        }

        if let Some(storage) = other.storage {
            if storage.path.is_some() {
                self.storage.path = storage.path;
            }
        }

        if let Some(journal) = other.journal {
            if let Some(enabled) = journal.enabled {
                self.journal.enabled = enabled;
            }
            if journal.path.is_some() {
                self.journal.path = journal.path;
            }
        }

        if let Some(auth) = other.auth {
            if let Some(role) = auth.admin_role {
                self.auth.admin_role = role;
            }
        }
    }

    /// Directory for state files when no explicit path is configured
    pub fn state_dir() -> PathBuf {
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("userdesk"))
            .unwrap_or_else(|| PathBuf::from(".userdesk"))
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("storage.json"))
    }

    pub fn journal_path(&self) -> PathBuf {
        self.journal
            .path
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("journal.jsonl"))
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: format!("Must be an http:// or https:// URL, got '{}'", url),
            });
        }

        if self.api.timeout_ms == Some(0) {
            errors.push(ValidationError {
                field: "api.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.auth.admin_role.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.admin_role".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
