//! Structure checks run before a template is accepted for editing.

use crate::mapping::{ExtractMode, SelectorMapping, SELECTOR_MAPPINGS};
use pagesmith_parser::parse;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub selector: String,
    pub message: String,
}

impl ValidationIssue {
    fn not_found(mapping: &SelectorMapping) -> Self {
        Self {
            path: mapping.path.to_string(),
            selector: mapping.selector.to_string(),
            message: format!("Selector \"{}\" not found in HTML", mapping.selector),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

/// Check the built-in mapping table against `html`
pub fn validate_selectors(html: &str) -> ValidationReport {
    validate_selectors_with(html, SELECTOR_MAPPINGS)
}

#[tracing::instrument(skip_all, fields(mappings = mappings.len()))]
pub fn validate_selectors_with(html: &str, mappings: &[SelectorMapping]) -> ValidationReport {
    let doc = match parse(html) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(error = %err, "template failed to parse, every mapping unresolved");
            return ValidationReport {
                valid: false,
                errors: mappings.iter().map(ValidationIssue::not_found).collect(),
                warnings: vec![format!("HTML could not be parsed: {}", err)],
            };
        }
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for mapping in mappings {
        match doc.count_matches(mapping.selector) {
            0 => errors.push(ValidationIssue::not_found(mapping)),
            1 => {}
            n if mapping.mode != ExtractMode::Html => warnings.push(format!(
                "Selector \"{}\" for {} matches {} elements; only the first is used",
                mapping.selector, mapping.path, n
            )),
            _ => {}
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Candidate replacements for a selector that no longer matches.
///
/// Tries the last compound alone, then the selector with `:nth-of-type(..)`
/// removed, keeping only candidates that match something.
pub fn suggest_selector_fixes(html: &str, broken: &str) -> Vec<String> {
    let Ok(doc) = parse(html) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    let parts: Vec<&str> = broken.split_whitespace().collect();
    if parts.len() > 1 {
        if let Some(last) = parts.last() {
            candidates.push(last.to_string());
            candidates.push(strip_nth_of_type(last));
        }
    }
    candidates.push(strip_nth_of_type(broken));

    let mut fixes: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim().to_string();
        if candidate.is_empty() || candidate == broken || fixes.contains(&candidate) {
            continue;
        }
        if doc.selector_exists(&candidate) {
            fixes.push(candidate);
        }
    }
    fixes
}

fn strip_nth_of_type(selector: &str) -> String {
    const PSEUDO: &str = ":nth-of-type(";
    let mut out = String::with_capacity(selector.len());
    let mut rest = selector;
    while let Some(at) = rest.find(PSEUDO) {
        out.push_str(&rest[..at]);
        let after = &rest[at + PSEUDO.len()..];
        rest = match after.find(')') {
            Some(close) => &after[close + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

/// True when `html` parses and has `html`, `head` and `body` elements
pub fn validate_html_structure(html: &str) -> bool {
    match parse(html) {
        Ok(doc) => ["html", "head", "body"]
            .iter()
            .all(|tag| doc.selector_exists(tag)),
        Err(err) => {
            tracing::debug!(error = %err, "structure check failed to parse");
            false
        }
    }
}
