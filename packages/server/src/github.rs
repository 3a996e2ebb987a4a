//! [`RemoteStore`] over the GitHub repository contents API.

use crate::config::GitHubSettings;
use crate::store::{RemoteFile, RemoteStore, StoreError, WriteOutcome};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";

pub struct GitHubStore {
    client: reqwest::Client,
    settings: GitHubSettings,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    content: ShaOnly,
    commit: Option<ShaOnly>,
}

#[derive(Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubErrorBody {
    message: String,
}

impl GitHubStore {
    pub fn new(settings: GitHubSettings) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pagesmith-server/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Misconfigured(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url,
            self.settings.owner,
            self.settings.repo,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.settings.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn error_for(path: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::Unauthorized(format!("GitHub rejected the token: {}", message))
            }
            StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict(format!(
                "{} changed upstream ({})",
                path, message
            )),
            other => StoreError::Upstream {
                status: other.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    #[tracing::instrument(skip(self), fields(repo = %self.settings.repo))]
    async fn read(&self, path: &str, git_ref: &str) -> Result<RemoteFile, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.contents_url(path))
            .query(&[("ref", git_ref)])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(path, response).await);
        }
        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(format!("unexpected contents response: {}", e)))?;
        Ok(RemoteFile {
            content: body.content,
            sha: body.sha,
        })
    }

    #[tracing::instrument(skip(self, content), fields(repo = %self.settings.repo))]
    async fn write(
        &self,
        path: &str,
        git_ref: &str,
        sha: Option<&str>,
        content: &str,
        message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let body = PutContentsRequest {
            message,
            content,
            branch: git_ref,
            sha,
        };
        let response = self
            .request(reqwest::Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(path, response).await);
        }
        let body: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(format!("unexpected commit response: {}", e)))?;
        tracing::info!(path, sha = %body.content.sha, "committed to GitHub");
        Ok(WriteOutcome {
            sha: body.content.sha,
            commit: body.commit.map(|c| c.sha),
        })
    }
}
