//! Versioned file storage behind the content endpoints.
//!
//! File bodies cross the [`RemoteStore`] boundary base64-encoded, the way the
//! GitHub contents API carries them. Every write must present the version
//! token (`sha`) of the file it replaces.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// A file as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Base64 body; may contain line breaks
    pub content: String,
    pub sha: String,
}

impl RemoteFile {
    /// Decode the body as UTF-8 text
    pub fn text(&self) -> Result<String, StoreError> {
        let compact: String = self.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| StoreError::InvalidData(format!("bad base64 body: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| StoreError::InvalidData(format!("body is not UTF-8: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Version token of the written file
    pub sha: String,
    pub commit: Option<String>,
}

pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn read(&self, path: &str, git_ref: &str) -> Result<RemoteFile, StoreError>;

    /// Replace (or create, when `sha` is `None`) the file at `path`
    async fn write(
        &self,
        path: &str,
        git_ref: &str,
        sha: Option<&str>,
        content: &str,
        message: &str,
    ) -> Result<WriteOutcome, StoreError>;
}

/// In-process store; version tokens are per-path counters
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, (String, u64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), (text.into(), 1));
        }
        self
    }

    fn token(path: &str, version: u64) -> String {
        format!("{}@{}", path, version)
    }

    fn poisoned() -> StoreError {
        StoreError::Upstream {
            status: 500,
            message: "memory store lock poisoned".into(),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self, path: &str, _git_ref: &str) -> Result<RemoteFile, StoreError> {
        let files = self.files.lock().map_err(|_| Self::poisoned())?;
        let (text, version) = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(RemoteFile {
            content: encode_content(text),
            sha: Self::token(path, *version),
        })
    }

    async fn write(
        &self,
        path: &str,
        _git_ref: &str,
        sha: Option<&str>,
        content: &str,
        message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let text = RemoteFile {
            content: content.to_string(),
            sha: String::new(),
        }
        .text()?;

        let mut files = self.files.lock().map_err(|_| Self::poisoned())?;
        let next = match (files.get(path), sha) {
            (Some((_, version)), Some(sha)) if Self::token(path, *version) == sha => version + 1,
            (None, None) => 1,
            (Some(_), _) => {
                return Err(StoreError::Conflict(format!("{} does not match {:?}", path, sha)))
            }
            (None, Some(_)) => return Err(StoreError::NotFound(path.to_string())),
        };
        files.insert(path.to_string(), (text, next));
        tracing::debug!(path, version = next, message, "memory store write");

        Ok(WriteOutcome {
            sha: Self::token(path, next),
            commit: None,
        })
    }
}

/// Stand-in used when the configured store cannot be built; every call
/// reports the misconfiguration
#[derive(Debug, Clone)]
pub struct UnconfiguredStore {
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RemoteStore for UnconfiguredStore {
    async fn read(&self, _path: &str, _git_ref: &str) -> Result<RemoteFile, StoreError> {
        Err(StoreError::Misconfigured(self.reason.clone()))
    }

    async fn write(
        &self,
        _path: &str,
        _git_ref: &str,
        _sha: Option<&str>,
        _content: &str,
        _message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        Err(StoreError::Misconfigured(self.reason.clone()))
    }
}
