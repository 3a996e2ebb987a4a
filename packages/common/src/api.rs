//! JSON bodies exchanged between the editor and the content server.

use chrono::{DateTime, Utc};
use pagesmith_content::{ContentDocument, InjectWarning};
use serde::{Deserialize, Serialize};

/// Per-file version tokens used for optimistic concurrency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTokens {
    pub html: String,
    pub content: String,
}

/// `GET /api/content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub html: String,
    pub content: ContentDocument,
    pub sha: VersionTokens,
    pub last_modified: DateTime<Utc>,
}

/// `POST /api/content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub content: ContentDocument,
    pub html_sha: String,
    pub content_sha: String,
    /// Page rendered from `content`
    pub html: String,
}

impl SaveRequest {
    pub fn new(content: ContentDocument, html: String, tokens: &VersionTokens) -> Self {
        Self {
            content,
            html_sha: tokens.html.clone(),
            content_sha: tokens.content.clone(),
            html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/preview`; both fields are required but optional here so a
/// missing one can be answered with 400 instead of a rejection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub content: Option<ContentDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub warnings: Vec<InjectWarning>,
}

/// `POST /api/validate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub html: String,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_request_wire_names() {
        let tokens = VersionTokens {
            html: "h1".into(),
            content: "c1".into(),
        };
        let request = SaveRequest::new(ContentDocument::default(), "<p></p>".into(), &tokens);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["htmlSha"], "h1");
        assert_eq!(value["contentSha"], "c1");
        assert_eq!(value["html"], "<p></p>");
    }

    #[test]
    fn test_load_response_parses() {
        let body = json!({
            "html": "<html></html>",
            "content": { "metadata": {}, "sections": [] },
            "sha": { "html": "a", "content": "b" },
            "lastModified": "2024-05-01T10:00:00Z"
        });
        let response: LoadResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.sha.content, "b");
        assert_eq!(response.last_modified.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_preview_request_tolerates_missing_fields() {
        let request: PreviewRequest = serde_json::from_value(json!({ "html": "<p></p>" })).unwrap();
        assert!(request.content.is_none());
    }
}
