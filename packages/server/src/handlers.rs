use crate::repository::SiteRepository;
use crate::store::StoreError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pagesmith_common::{ErrorBody, PreviewRequest, PreviewResponse, SaveRequest, ValidateRequest};
use pagesmith_content::{
    inject_with_report, suggest_selector_fixes, validate_html_structure, validate_selectors,
    ValidationReport,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<SiteRepository>,
}

/// Error reply with an `{ "error": .. }` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Network(_) | StoreError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            StoreError::Misconfigured(_) | StoreError::InvalidData(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// `POST /api/preview`
pub async fn preview(
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(request) = payload?;
    let (Some(html), Some(content)) = (request.html, request.content) else {
        return Err(ApiError::bad_request("Missing html or content"));
    };

    let report = inject_with_report(&html, &content)
        .map_err(|e| ApiError::internal(format!("Failed to inject content: {}", e)))?;
    debug!(warnings = report.warnings.len(), "preview rendered");

    Ok(Json(PreviewResponse {
        html: report.html,
        success: true,
        warnings: report.warnings,
    }))
}

/// `GET /api/content`
pub async fn load_content(
    State(state): State<AppState>,
) -> Result<Json<pagesmith_common::LoadResponse>, ApiError> {
    let loaded = state.repository.load().await?;
    Ok(Json(loaded))
}

/// `POST /api/content`
pub async fn save_content(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<pagesmith_common::SaveResponse>, ApiError> {
    let Json(request) = payload?;
    if request.html_sha.trim().is_empty() || request.content_sha.trim().is_empty() {
        return Err(ApiError::bad_request("Missing htmlSha or contentSha"));
    }
    if request.html.trim().is_empty() {
        return Err(ApiError::bad_request("Missing html"));
    }

    let saved = state.repository.save(&request).await?;
    info!(sections = request.content.sections.len(), "content saved");
    Ok(Json(saved))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    #[serde(flatten)]
    pub report: ValidationReport,
    /// Document has `html`, `head` and `body`
    pub structure_valid: bool,
    /// Replacement candidates per broken content path
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub suggestions: BTreeMap<String, Vec<String>>,
}

/// `POST /api/validate`
pub async fn validate(
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = payload?;
    let report = validate_selectors(&request.html);

    let suggestions = report
        .errors
        .iter()
        .filter_map(|issue| {
            let fixes = suggest_selector_fixes(&request.html, &issue.selector);
            (!fixes.is_empty()).then(|| (issue.path.clone(), fixes))
        })
        .collect();

    Ok(Json(ValidateResponse {
        structure_valid: validate_html_structure(&request.html),
        report,
        suggestions,
    }))
}
