//! # Local draft cache
//!
//! Key-value string storage used for local-only drafts. The editor writes four
//! keys per draft:
//!
//! | key               | value                                   |
//! |-------------------|-----------------------------------------|
//! | `draft`           | serialized [`ContentDocument`]          |
//! | `draft-html`      | template HTML the draft was made against |
//! | `draft-sha`       | serialized [`VersionTokens`]            |
//! | `draft-timestamp` | RFC 3339 save time                      |

use crate::api::VersionTokens;
use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use pagesmith_content::ContentDocument;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DRAFT_KEY: &str = "draft";
pub const DRAFT_HTML_KEY: &str = "draft-html";
pub const DRAFT_SHA_KEY: &str = "draft-sha";
pub const DRAFT_TIMESTAMP_KEY: &str = "draft-timestamp";

/// String key-value storage abstraction
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    fn remove(&self, key: &str) -> CacheResult<()>;
}

/// In-process cache for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Cache persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> CacheResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let _guard = self.lock.lock().map_err(|_| CacheError::Poisoned)?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let _guard = self.lock.lock().map_err(|_| CacheError::Poisoned)?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// A locally saved draft
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub content: ContentDocument,
    pub html: Option<String>,
    pub sha: Option<VersionTokens>,
    pub timestamp: DateTime<Utc>,
}

impl Draft {
    pub fn store(&self, cache: &dyn LocalCache) -> CacheResult<()> {
        cache.set(DRAFT_KEY, &serde_json::to_string(&self.content)?)?;
        match &self.html {
            Some(html) => cache.set(DRAFT_HTML_KEY, html)?,
            None => cache.remove(DRAFT_HTML_KEY)?,
        }
        match &self.sha {
            Some(sha) => cache.set(DRAFT_SHA_KEY, &serde_json::to_string(sha)?)?,
            None => cache.remove(DRAFT_SHA_KEY)?,
        }
        cache.set(DRAFT_TIMESTAMP_KEY, &self.timestamp.to_rfc3339())?;
        tracing::debug!(timestamp = %self.timestamp, "draft stored");
        Ok(())
    }

    /// `None` when no draft has been saved
    pub fn load(cache: &dyn LocalCache) -> CacheResult<Option<Self>> {
        let Some(raw) = cache.get(DRAFT_KEY)? else {
            return Ok(None);
        };
        let content = serde_json::from_str(&raw)?;
        let html = cache.get(DRAFT_HTML_KEY)?;
        let sha = cache
            .get(DRAFT_SHA_KEY)?
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let timestamp = match cache.get(DRAFT_TIMESTAMP_KEY)? {
            Some(ts) => DateTime::parse_from_rfc3339(&ts)?.with_timezone(&Utc),
            None => DateTime::<Utc>::default(),
        };
        Ok(Some(Self {
            content,
            html,
            sha,
            timestamp,
        }))
    }

    pub fn clear(cache: &dyn LocalCache) -> CacheResult<()> {
        for key in [DRAFT_KEY, DRAFT_HTML_KEY, DRAFT_SHA_KEY, DRAFT_TIMESTAMP_KEY] {
            cache.remove(key)?;
        }
        Ok(())
    }
}
