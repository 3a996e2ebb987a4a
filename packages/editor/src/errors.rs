//! Error types for the editor

use crate::backend::BackendError;
use pagesmith_common::CacheError;
use pagesmith_content::InjectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Section {id} is invalid after update: {source}")]
    InvalidSection {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate section id: {0}")]
    DuplicateSectionId(String),

    #[error("No page template loaded; load from the server first")]
    NoTemplate,

    #[error("Render error: {0}")]
    Inject(#[from] InjectError),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),

    #[error("Editor has been disposed")]
    Disposed,
}
