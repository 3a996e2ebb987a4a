//! Live preview document.
//!
//! Keeps a parsed template in memory so repeated edits only re-apply content
//! instead of re-parsing. Rendering can optionally annotate the elements the
//! last [`LiveDocument::apply`] changed; production rendering never does, and
//! always strips highlight markers that may already be present in a template.

use crate::error::InjectError;
use crate::injector::{InjectWarning, Injector};
use crate::model::ContentDocument;
use pagesmith_parser::{parse, HtmlDocument, NodeId};

pub const HIGHLIGHT_CLASS: &str = "pagesmith-changed";
pub const HIGHLIGHT_ATTR: &str = "data-pagesmith-changed";
pub const HIGHLIGHT_STYLE: &str = "outline: 2px dashed #f59e0b; outline-offset: 2px";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Annotate {
    /// Clean output, safe to publish
    #[default]
    None,
    /// Mark elements changed by the last apply
    Changes,
}

#[derive(Debug, Clone)]
pub struct LiveDocument {
    doc: HtmlDocument,
    changed: Vec<NodeId>,
}

impl LiveDocument {
    pub fn new(template: &str) -> Result<Self, InjectError> {
        Ok(Self::from_document(parse(template)?))
    }

    pub fn from_document(doc: HtmlDocument) -> Self {
        Self {
            doc,
            changed: Vec::new(),
        }
    }

    /// Apply content in place, replacing the changed set
    pub fn apply(&mut self, content: &ContentDocument) -> Vec<InjectWarning> {
        let (warnings, mut changed) = Injector::new(&mut self.doc).run(content);
        changed.sort();
        changed.dedup();
        self.changed = changed;
        warnings
    }

    pub fn changed(&self) -> &[NodeId] {
        &self.changed
    }

    pub fn document(&self) -> &HtmlDocument {
        &self.doc
    }

    pub fn render(&self, annotate: Annotate) -> String {
        let mut out = self.doc.clone();
        strip_highlighting(&mut out);
        if annotate == Annotate::Changes {
            for id in &self.changed {
                annotate_node(&mut out, *id);
            }
        }
        out.serialize()
    }
}

/// Mark one element as changed
pub fn annotate_node(doc: &mut HtmlDocument, id: NodeId) {
    if !doc.node(id).is_element() {
        return;
    }
    doc.add_class(id, HIGHLIGHT_CLASS);
    doc.set_attribute_of(id, HIGHLIGHT_ATTR, "true");

    let style = match doc.attribute(id, "style").map(str::trim) {
        Some(existing) if !existing.is_empty() => {
            format!("{}; {}", existing.trim_end_matches(';'), HIGHLIGHT_STYLE)
        }
        _ => HIGHLIGHT_STYLE.to_string(),
    };
    doc.set_attribute_of(id, "style", &style);
}

/// Remove every highlight class, attribute and style; returns how many
/// elements were cleaned
pub fn strip_highlighting(doc: &mut HtmlDocument) -> usize {
    let mut cleaned = 0;
    for id in doc.descendants(doc.root()) {
        if !doc.node(id).is_element() {
            continue;
        }
        let mut changed = doc.remove_class(id, HIGHLIGHT_CLASS);
        changed |= doc.remove_attribute_of(id, HIGHLIGHT_ATTR);

        if let Some(style) = doc.attribute(id, "style") {
            if style.contains(HIGHLIGHT_STYLE) {
                let rest = style
                    .replace(&format!("; {}", HIGHLIGHT_STYLE), "")
                    .replace(HIGHLIGHT_STYLE, "");
                let rest = rest.trim().trim_matches(';').trim().to_string();
                changed |= if rest.is_empty() {
                    doc.remove_attribute_of(id, "style")
                } else {
                    doc.set_attribute_of(id, "style", &rest)
                };
            }
        }

        if changed {
            cleaned += 1;
        }
    }
    if cleaned > 0 {
        tracing::debug!(cleaned, "stripped highlight markers");
    }
    cleaned
}
