use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::session::token_fingerprint;

/// Append-only JSON-lines record of what the console did.
pub struct Journal {
    pub path: Option<PathBuf>,
    console_id: String,
    file: Option<File>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    console_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn new(path: &Path, console_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            console_id: console_id.to_string(),
            file: Some(file),
        })
    }

    /// A journal that accepts events and writes nothing.
    pub fn disabled(console_id: &str) -> Self {
        Self {
            path: None,
            console_id: console_id.to_string(),
            file: None,
        }
    }

    pub fn console_id(&self) -> &str {
        &self.console_id
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let event = Event {
            ts: Utc::now(),
            console_id: &self.console_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn login(
        &mut self,
        email: &str,
        token: &str,
        role: Option<&str>,
        expires: Option<&str>,
    ) -> Result<()> {
        self.log(
            "login",
            serde_json::json!({
                "email": email,
                "token": token_fingerprint(token),
                "role": role,
                "expiration": expires,
            }),
        )
    }

    pub fn login_failed(&mut self, email: &str, reason: &str) -> Result<()> {
        self.log(
            "login_failed",
            serde_json::json!({ "email": email, "reason": reason }),
        )
    }

    pub fn logout(&mut self, token: Option<&str>) -> Result<()> {
        self.log(
            "logout",
            serde_json::json!({ "token": token.map(token_fingerprint) }),
        )
    }

    pub fn token_refreshed(&mut self, old: &str, new: &str) -> Result<()> {
        self.log(
            "token_refreshed",
            serde_json::json!({
                "from": token_fingerprint(old),
                "to": token_fingerprint(new),
            }),
        )
    }

    pub fn user_registered(&mut self, email: &str, role: &str) -> Result<()> {
        self.log(
            "user_registered",
            serde_json::json!({ "email": email, "role": role }),
        )
    }

    pub fn user_updated(&mut self, user_id: &str) -> Result<()> {
        self.log("user_updated", serde_json::json!({ "user_id": user_id }))
    }

    pub fn user_deleted(&mut self, user_id: &str) -> Result<()> {
        self.log("user_deleted", serde_json::json!({ "user_id": user_id }))
    }

    pub fn api_error(&mut self, page: &str, operation: &str, error: &str) -> Result<()> {
        self.log(
            "api_error",
            serde_json::json!({
                "page": page,
                "operation": operation,
                "error": error,
            }),
        )
    }
}
