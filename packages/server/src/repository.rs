//! The page template and its content document as a versioned pair.

use crate::store::{encode_content, RemoteStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use pagesmith_common::{LoadResponse, SaveRequest, SaveResponse, VersionTokens};
use pagesmith_content::ContentDocument;
use pagesmith_editor::{BackendError, ContentBackend};
use std::sync::Arc;

pub struct SiteRepository {
    store: Arc<dyn RemoteStore>,
    branch: String,
    html_path: String,
    content_path: String,
}

impl SiteRepository {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        branch: impl Into<String>,
        html_path: impl Into<String>,
        content_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            branch: branch.into(),
            html_path: html_path.into(),
            content_path: content_path.into(),
        }
    }

    #[tracing::instrument(skip(self), fields(html = %self.html_path, content = %self.content_path))]
    pub async fn load(&self) -> Result<LoadResponse, StoreError> {
        let (html_file, content_file) = tokio::try_join!(
            self.store.read(&self.html_path, &self.branch),
            self.store.read(&self.content_path, &self.branch),
        )?;

        let html = html_file.text()?;
        let content: ContentDocument = serde_json::from_str(&content_file.text()?).map_err(|e| {
            StoreError::InvalidData(format!("{} is not a content document: {}", self.content_path, e))
        })?;

        tracing::info!(sections = content.sections.len(), "site loaded");
        Ok(LoadResponse {
            html,
            content,
            sha: VersionTokens {
                html: html_file.sha,
                content: content_file.sha,
            },
            last_modified: Utc::now(),
        })
    }

    /// Commit the rendered page, then the content, each guarded by its token
    #[tracing::instrument(skip_all, fields(html = %self.html_path, content = %self.content_path))]
    pub async fn save(&self, request: &SaveRequest) -> Result<SaveResponse, StoreError> {
        let content = serde_json::to_string_pretty(&request.content)
            .map_err(|e| StoreError::InvalidData(format!("content does not serialize: {}", e)))?;

        self.store
            .write(
                &self.html_path,
                &self.branch,
                Some(&request.html_sha),
                &encode_content(&request.html),
                &format!("Update {}", self.html_path),
            )
            .await?;
        self.store
            .write(
                &self.content_path,
                &self.branch,
                Some(&request.content_sha),
                &encode_content(&content),
                &format!("Update {}", self.content_path),
            )
            .await?;

        tracing::info!("site saved");
        Ok(SaveResponse {
            success: true,
            message: "Content saved successfully".into(),
            timestamp: Utc::now(),
        })
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => BackendError::Conflict,
            StoreError::Unauthorized(_) => BackendError::Unauthorized,
            StoreError::NotFound(path) => BackendError::NotFound(path),
            StoreError::Misconfigured(message) => BackendError::Misconfigured(message),
            StoreError::Network(message) => BackendError::Network(message),
            StoreError::Upstream { status, message } => BackendError::Server { status, message },
            StoreError::InvalidData(message) => BackendError::Server {
                status: 500,
                message,
            },
        }
    }
}

/// Lets an editor store work against the repository in-process
#[async_trait]
impl ContentBackend for SiteRepository {
    async fn load(&self) -> Result<LoadResponse, BackendError> {
        SiteRepository::load(self).await.map_err(BackendError::from)
    }

    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, BackendError> {
        SiteRepository::save(self, &request).await.map_err(BackendError::from)
    }
}
