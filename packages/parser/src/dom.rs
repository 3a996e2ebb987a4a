//! # Arena DOM
//!
//! Nodes live in a flat arena owned by [`HtmlDocument`](crate::HtmlDocument)
//! and are addressed by [`NodeId`] handles. Every node parsed from source keeps
//! the byte span it came from, which is what lets the lossless serializer copy
//! untouched markup verbatim.
//!
//! Detached nodes (children replaced by a mutation) stay in the arena but are
//! no longer reachable from the root.

use std::ops::Range;

/// Stable handle to a node in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Byte range in the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Elements that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void(local: &str) -> bool {
    VOID_ELEMENTS.contains(&local)
}

pub fn is_raw_text(local: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&local)
}

/// A single attribute with enough source detail to re-render it faithfully
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name as written
    pub name: String,

    /// Decoded value (`None` for bare attributes like `hidden`)
    pub value: Option<String>,

    /// Quote character used in the source, if any
    pub quote: Option<char>,

    /// Whitespace that preceded the attribute
    pub leading: String,

    /// Original attribute text; cleared once the value is changed
    pub raw: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            quote: Some('"'),
            leading: " ".to_string(),
            raw: None,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name as written in the source
    pub name: String,

    /// Lowercased tag name used for matching
    pub local: String,

    pub attrs: Vec<Attribute>,

    /// Source text between the last attribute and the end of the start tag
    pub tag_tail: String,

    /// Start tag used `/>`
    pub self_closing: bool,

    /// Element was closed by an explicit end tag
    pub has_end_tag: bool,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        let local = name.to_ascii_lowercase();
        let has_end_tag = !is_void(&local);
        Self {
            name: name.to_string(),
            local,
            attrs: Vec::new(),
            tag_tail: ">".to_string(),
            self_closing: false,
            has_end_tag,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.matches_name(name))
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr_value("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr_value("class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.local)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,

    Element(ElementData),

    /// Text as it appears in markup (still entity-encoded)
    Text(String),

    /// Full comment including delimiters
    Comment(String),

    Doctype(String),

    /// Markup preserved verbatim: stray end tags, CDATA, processing instructions
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    /// Outer span in the source (`None` for nodes created by mutation)
    pub span: Option<Span>,
    pub start_tag: Option<Span>,
    pub end_tag: Option<Span>,

    /// Start tag must be re-rendered from `ElementData`
    pub(crate) tag_dirty: bool,

    /// Node or a descendant changed since parsing
    pub(crate) touched: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            span: None,
            start_tag: None,
            end_tag: None,
            tag_dirty: false,
            touched: false,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn local_name(&self) -> Option<&str> {
        self.element().map(|e| e.local.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_data_defaults() {
        let br = ElementData::new("BR");
        assert_eq!(br.local, "br");
        assert!(br.is_void());
        assert!(!br.has_end_tag);

        let div = ElementData::new("div");
        assert!(div.has_end_tag);
    }

    #[test]
    fn test_class_lookup() {
        let mut data = ElementData::new("div");
        data.attrs.push(Attribute::new("class", Some("team-member  featured".into())));
        assert!(data.has_class("featured"));
        assert!(data.has_class("team-member"));
        assert!(!data.has_class("team"));
    }
}
