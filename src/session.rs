//! Persistent session storage.
//!
//! The console keeps its credential in a small key/value store that survives
//! restarts, the way a browser keeps it in local storage. Two keys matter:
//! `token` and `role`. The store is the single source of truth; callers read
//! it at the moment they need a decision and never cache the answer.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";

/// Key/value storage behind the session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed store. Every read goes back to disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session store unreadable"
                );
                return BTreeMap::new();
            }
        };
        if content.trim().is_empty() {
            return BTreeMap::new();
        }
        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session store malformed, treating as empty"
                );
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create storage directory {}", parent.display())
                })?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;

        // Owner-only, written beside the target and renamed into place.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let _ = std::fs::remove_file(&tmp);

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        drop(file);

        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to write session store {}", self.path.display()))?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_all();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_all();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            self.write_all(&BTreeMap::new())?;
        }
        Ok(())
    }
}

/// In-process store, used for tests and `--storage -`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

/// Snapshot of the credential pair at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl Session {
    pub fn load(store: &dyn SessionStore) -> Self {
        Self {
            token: store.get(TOKEN_KEY).filter(|t| !t.is_empty()),
            role: store.get(ROLE_KEY).filter(|r| !r.is_empty()),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Anonymous -> Authenticated. A missing role removes any stale one.
    pub fn establish(store: &dyn SessionStore, token: &str, role: Option<&str>) -> Result<()> {
        store.set(TOKEN_KEY, token)?;
        match role {
            Some(role) => store.set(ROLE_KEY, role)?,
            None => store.remove(ROLE_KEY)?,
        }
        Ok(())
    }

    /// Authenticated -> Anonymous.
    pub fn end(store: &dyn SessionStore) -> Result<()> {
        store.remove(TOKEN_KEY)?;
        store.remove(ROLE_KEY)?;
        Ok(())
    }
}

/// Short, stable identifier for a token that is safe to print or log.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)[..12].to_string()
}

/// Claims read out of a JWT payload. Nothing here is verified.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|s| DateTime::from_timestamp(s, 0))
    }
}

/// Decode the payload segment of a JWT. Returns None for anything that is
/// not a three-part token with a JSON payload.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).ok()?;
    serde_json::from_slice(&payload).ok()
}
