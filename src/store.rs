//! Persistent session storage
//!
//! A flat map of fixed string keys to string values, written through to a JSON
//! file on every mutation so a session survives process restarts. Typed
//! accessors cover the credential record; `clear_session` wipes every key
//! auto-logout is responsible for.

use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TokenStorageConfig;
use crate::error::{FeedError, Result};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_ROLE_KEY: &str = "userRole";
pub const USER_ID_KEY: &str = "userId";
pub const GUEST_UUID_KEY: &str = "guestUUID";
pub const GUEST_KEYWORDS_KEY: &str = "guestSelectedKeywords";
pub const EXPIRES_AT_KEY: &str = "expiresAt";

/// Every key removed on logout
pub const SESSION_KEYS: [&str; 7] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USER_ROLE_KEY,
    USER_ID_KEY,
    GUEST_UUID_KEY,
    GUEST_KEYWORDS_KEY,
    EXPIRES_AT_KEY,
];

/// Session tier reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Guest,
    User,
    Admin,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "GUEST" => Role::Guest,
            "USER" => Role::User,
            "ADMIN" => Role::Admin,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Guest => "GUEST",
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials issued by login or refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Parse the backend's `expired_at`: RFC 3339, or a zone-less local timestamp taken as UTC
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Key-value session store
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl SessionStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// File-backed store; loads existing entries from `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        tracing::debug!("Opened session store at {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn from_config(config: &TokenStorageConfig) -> Result<Self> {
        match (&config.enabled, &config.storage_path) {
            (true, Some(path)) => Self::open(path),
            (true, None) => Err(FeedError::config("Token storage path not configured")),
            (false, _) => Ok(Self::in_memory()),
        }
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.into());
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    // --- credential record ---

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.get(USER_ROLE_KEY).map(|r| Role::parse(&r))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.get(EXPIRES_AT_KEY).and_then(|raw| parse_expiry(&raw))
    }

    pub fn credentials(&self) -> Option<CredentialRecord> {
        Some(CredentialRecord {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            role: self.role().unwrap_or(Role::Guest),
            expires_at: self.expires_at(),
        })
    }

    /// Write a full credential record in one persist
    pub fn save_credentials(&self, record: &CredentialRecord) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), record.access_token.clone());
        entries.insert(REFRESH_TOKEN_KEY.to_string(), record.refresh_token.clone());
        entries.insert(USER_ROLE_KEY.to_string(), record.role.as_str().to_string());
        match record.expires_at {
            Some(at) => {
                entries.insert(EXPIRES_AT_KEY.to_string(), at.to_rfc3339());
            }
            None => {
                entries.remove(EXPIRES_AT_KEY);
            }
        }
        self.persist(&entries)
    }

    /// Overwrite the access token after a refresh; the refresh token is only
    /// replaced when `refresh_token` is given
    pub fn update_access_token(
        &self,
        access_token: &str,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), access_token.to_string());
        if let Some(at) = expires_at {
            entries.insert(EXPIRES_AT_KEY.to_string(), at.to_rfc3339());
        }
        if let Some(token) = refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), token.to_string());
        }
        self.persist(&entries)
    }

    // --- role helpers ---

    /// Role GUEST or no role at all
    pub fn is_guest(&self) -> bool {
        matches!(self.role(), None | Some(Role::Guest))
    }

    /// Holds an access token and a non-guest role
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some() && !self.is_guest()
    }

    pub fn has_session(&self) -> bool {
        self.access_token().is_some()
    }

    // --- guest keyword selection ---

    pub fn guest_keywords(&self) -> Vec<i64> {
        self.get(GUEST_KEYWORDS_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<i64>>(&raw).ok())
            .unwrap_or_default()
    }

    /// Persist the selection; an empty selection removes the key
    pub fn set_guest_keywords(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return self.remove(GUEST_KEYWORDS_KEY);
        }
        let encoded = serde_json::to_string(ids)?;
        self.set(GUEST_KEYWORDS_KEY, encoded)
    }

    /// Remove every session key
    pub fn clear_session(&self) -> Result<()> {
        let mut entries = self.entries.lock();
        for key in SESSION_KEYS {
            entries.remove(key);
        }
        self.persist(&entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FeedError::storage_from_io("Failed to create storage directory", e)
            })?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        fs::write(path, content)
            .map_err(|e| FeedError::storage_from_io("Failed to write session storage", e))?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| FeedError::storage_from_io("Failed to read session storage", e))?;

    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        FeedError::storage(
            "Failed to parse session storage",
            format!("{}: {}", path.display(), e),
        )
    })
}
