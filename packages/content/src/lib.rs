//! # Pagesmith Content
//!
//! Structured page content and its synchronization with HTML.
//!
//! ```text
//! ContentDocument ──inject──▶ HTML template ──extract──▶ field values
//!                                  │
//!                                  └──validate──▶ ValidationReport
//! ```
//!
//! - [`model`]: the content document and typed section payloads
//! - [`mapping`]: the declarative content-path → selector table
//! - [`injector`]: writes content into markup without disturbing other bytes
//! - [`extractor`]: reads fields back and diffs two renders
//! - [`validator`]: checks a template against the mapping table
//! - [`live`]: in-memory preview document with optional change highlighting

pub mod error;
pub mod extractor;
pub mod injector;
pub mod live;
pub mod mapping;
pub mod model;
pub mod validator;

pub use error::{InjectError, UnknownExtractMode};
pub use extractor::{detect_changes, extract_field, extract_field_named, extract_mapped_fields};
pub use injector::{inject_content_into_html, inject_with_report, InjectReport, InjectWarning};
pub use live::{strip_highlighting, Annotate, LiveDocument};
pub use mapping::{ExtractMode, SelectorMapping, SELECTOR_MAPPINGS};
pub use model::{ContentDocument, Metadata, Section, SectionContent};
pub use validator::{
    suggest_selector_fixes, validate_html_structure, validate_selectors, validate_selectors_with,
    ValidationIssue, ValidationReport,
};
