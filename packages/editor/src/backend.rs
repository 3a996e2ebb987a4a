//! Persistence seam used by the editor store.
//!
//! [`ContentBackend`] is implemented in-process by the server's site
//! repository and over HTTP by [`HttpBackend`].

use async_trait::async_trait;
use pagesmith_common::{ErrorBody, LoadResponse, SaveRequest, SaveResponse};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Persistence failures, each with its own user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Conflict: the content was changed elsewhere. Please reload and try again.")]
    Conflict,

    #[error("Unauthorized: the server rejected the repository credentials")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl BackendError {
    /// Classify a failed response by status, falling back to the message
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            409 => BackendError::Conflict,
            401 | 403 => BackendError::Unauthorized,
            404 => BackendError::NotFound(message),
            _ if message.contains("409") || message.to_lowercase().contains("conflict") => {
                BackendError::Conflict
            }
            _ => BackendError::Server { status, message },
        }
    }

    /// Worth retrying without user intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}

/// Load and publish page content
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Current page HTML, content and version tokens
    async fn load(&self) -> Result<LoadResponse, BackendError>;

    /// Publish rendered HTML and content guarded by version tokens
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, BackendError>;
}

/// Backend speaking to a content server over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pagesmith-editor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Misconfigured(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| BackendError::Network(format!("Invalid response body: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                }
            });

        if status == StatusCode::INTERNAL_SERVER_ERROR && message.contains("configur") {
            return Err(BackendError::Misconfigured(message));
        }
        Err(BackendError::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    async fn load(&self) -> Result<LoadResponse, BackendError> {
        let response = self
            .client
            .get(self.url("/api/content"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/api/content"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}
