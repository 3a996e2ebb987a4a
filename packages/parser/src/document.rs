use crate::dom::{Attribute, ElementData, Node, NodeId, NodeKind};
use crate::entities;
use crate::error::{ParseResult, SelectorError};
use crate::lossless_serializer::LosslessSerializer;
use crate::parser::parse_fragment_into;
use crate::selector::SelectorList;
use std::fmt;

/// A parsed HTML document with selector-addressed read/write access.
///
/// Reads and writes come in two flavours:
/// - `*_of(id, ..)` operate on a [`NodeId`] and report whether anything changed
/// - selector-based wrappers (`get_text`, `set_attribute`, ...) resolve the first
///   match, log a warning when nothing matches and return an empty value / `false`
///
/// [`serialize`](Self::serialize) reproduces the source byte-for-byte when no
/// mutation took effect.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl HtmlDocument {
    pub(crate) fn from_parts(source: String, nodes: Vec<Node>, root: NodeId) -> Self {
        Self {
            source,
            nodes,
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent if it is an element (the document node is not)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.nodes[p.0].is_element())
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|s| *s == id)?;
        siblings[..at]
            .iter()
            .rev()
            .copied()
            .find(|s| self.nodes[s.0].is_element())
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|s| *s == id)?;
        siblings[at + 1..]
            .iter()
            .copied()
            .find(|s| self.nodes[s.0].is_element())
    }

    /// Descendants of `scope` in document order, excluding `scope` itself
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// True once any mutation has taken effect
    pub fn is_modified(&self) -> bool {
        self.nodes[self.root.0].touched
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn compile(selector: &str) -> Result<SelectorList, SelectorError> {
        SelectorList::parse(selector).inspect_err(|err| {
            tracing::warn!(selector, error = %err, "invalid selector");
        })
    }

    /// Elements under `scope` matched by an already-compiled selector
    pub fn select(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// All elements under `scope` matching `selector`; invalid selectors match nothing
    pub fn select_within(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        match Self::compile(selector) {
            Ok(list) => self.select(scope, &list),
            Err(_) => Vec::new(),
        }
    }

    pub fn first_within(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let list = Self::compile(selector).ok()?;
        self.descendants(scope)
            .into_iter()
            .find(|id| list.matches(self, *id))
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.first_within(self.root, selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.select_within(self.root, selector)
    }

    pub fn selector_exists(&self, selector: &str) -> bool {
        self.query_selector(selector).is_some()
    }

    pub fn count_matches(&self, selector: &str) -> usize {
        self.query_selector_all(selector).len()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Concatenated decoded text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(raw) = &self.nodes[id.0].kind {
            self.push_text(id, raw, &mut out);
            return out;
        }
        for desc in self.descendants(id) {
            if let NodeKind::Text(raw) = &self.nodes[desc.0].kind {
                self.push_text(desc, raw, &mut out);
            }
        }
        out
    }

    fn push_text(&self, id: NodeId, raw: &str, out: &mut String) {
        let opaque = self
            .parent(id)
            .and_then(|p| self.nodes[p.0].local_name())
            .is_some_and(|name| name == "script" || name == "style");
        if opaque {
            out.push_str(raw);
        } else {
            out.push_str(&entities::decode(raw));
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        LosslessSerializer::new(&self.source, &self.nodes).serialize_children(id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        LosslessSerializer::new(&self.source, &self.nodes).serialize(id)
    }

    /// Decoded attribute value; bare attributes read as `""`
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].element()?.attr_value(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id.0]
            .element()
            .is_some_and(|data| data.has_class(class))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    fn touch(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            self.nodes[current.0].touched = true;
            cursor = self.nodes[current.0].parent;
        }
    }

    fn edit_element<F>(&mut self, id: NodeId, edit: F) -> bool
    where
        F: FnOnce(&mut ElementData) -> bool,
    {
        let changed = match self.nodes[id.0].element_mut() {
            Some(data) => edit(data),
            None => false,
        };
        if changed {
            self.nodes[id.0].tag_dirty = true;
            self.touch(id);
        }
        changed
    }

    /// Set an attribute, adding it when absent. Returns false when the value
    /// was already equal or `id` is not an element.
    pub fn set_attribute_of(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        self.edit_element(id, |data| {
            match data.attrs.iter_mut().find(|a| a.matches_name(name)) {
                Some(attr) if attr.value.as_deref() == Some(value) => false,
                Some(attr) => {
                    attr.value = Some(value.to_string());
                    attr.raw = None;
                    if attr.quote.is_none() {
                        attr.quote = Some('"');
                    }
                    true
                }
                None => {
                    data.attrs
                        .push(Attribute::new(name, Some(value.to_string())));
                    true
                }
            }
        })
    }

    /// Add a bare (valueless) attribute such as `hidden`
    pub fn set_flag_attribute_of(&mut self, id: NodeId, name: &str) -> bool {
        self.edit_element(id, |data| {
            if data.attr(name).is_some() {
                return false;
            }
            data.attrs.push(Attribute::new(name, None));
            true
        })
    }

    pub fn remove_attribute_of(&mut self, id: NodeId, name: &str) -> bool {
        self.edit_element(id, |data| {
            let before = data.attrs.len();
            data.attrs.retain(|a| !a.matches_name(name));
            data.attrs.len() != before
        })
    }

    /// Add or remove `hidden` so the element is shown when `visible`
    pub fn set_visible_of(&mut self, id: NodeId, visible: bool) -> bool {
        if visible {
            self.remove_attribute_of(id, "hidden")
        } else {
            self.set_flag_attribute_of(id, "hidden")
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) || !self.nodes[id.0].is_element() {
            return false;
        }
        let current = self.attribute(id, "class").unwrap_or("").trim().to_string();
        let updated = if current.is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current, class)
        };
        self.set_attribute_of(id, "class", &updated)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        let remaining: Vec<&str> = self
            .attribute(id, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        if remaining.is_empty() {
            return self.remove_attribute_of(id, "class");
        }
        let updated = remaining.join(" ");
        self.set_attribute_of(id, "class", &updated)
    }

    /// Force a class on or off
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) -> bool {
        if on {
            self.add_class(id, class)
        } else {
            self.remove_class(id, class)
        }
    }

    fn replace_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        for child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
        self.touch(id);
    }

    fn new_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(kind);
        node.touched = true;
        self.nodes.push(node);
        id
    }

    /// Replace the children of `id` with a single text node
    pub fn set_text_of(&mut self, id: NodeId, text: &str) -> bool {
        if !self.nodes[id.0].is_element() {
            return false;
        }
        let escaped = entities::escape_text(text);
        if self.inner_html(id) == escaped {
            return false;
        }
        let mut children = Vec::new();
        if !escaped.is_empty() {
            children.push(self.new_detached(NodeKind::Text(escaped.into_owned())));
        }
        self.replace_children(id, children);
        true
    }

    /// Replace the children of `id` with text lines separated by `<br>`
    pub fn set_multiline_text_of(&mut self, id: NodeId, text: &str) -> bool {
        if !self.nodes[id.0].is_element() {
            return false;
        }
        let normalized = text.replace("\r\n", "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();

        let rendered = lines
            .iter()
            .map(|line| entities::escape_text(line))
            .collect::<Vec<_>>()
            .join("<br>");
        if self.inner_html(id) == rendered {
            return false;
        }

        let mut children = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                children.push(self.new_detached(NodeKind::Element(ElementData::new("br"))));
            }
            if !line.is_empty() {
                let escaped = entities::escape_text(line).into_owned();
                children.push(self.new_detached(NodeKind::Text(escaped)));
            }
        }
        self.replace_children(id, children);
        true
    }

    /// Replace the children of `id` with parsed markup
    pub fn set_inner_html_of(&mut self, id: NodeId, html: &str) -> ParseResult<bool> {
        if !self.nodes[id.0].is_element() || self.inner_html(id) == html {
            return Ok(false);
        }
        let children = parse_fragment_into(html, &mut self.nodes)?;
        self.replace_children(id, children);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Selector-addressed convenience
    // ------------------------------------------------------------------

    fn resolve(&self, selector: &str) -> Option<NodeId> {
        let found = self.query_selector(selector);
        if found.is_none() {
            tracing::warn!(selector, "selector not found");
        }
        found
    }

    pub fn get_text(&self, selector: &str) -> String {
        self.resolve(selector)
            .map(|id| self.text_content(id))
            .unwrap_or_default()
    }

    pub fn get_inner_html(&self, selector: &str) -> String {
        self.resolve(selector)
            .map(|id| self.inner_html(id))
            .unwrap_or_default()
    }

    pub fn get_attribute(&self, selector: &str, name: &str) -> String {
        self.resolve(selector)
            .and_then(|id| self.attribute(id, name))
            .unwrap_or_default()
            .to_string()
    }

    /// Returns true when the selector matched, whether or not bytes changed
    pub fn set_text(&mut self, selector: &str, text: &str) -> bool {
        match self.resolve(selector) {
            Some(id) => {
                self.set_text_of(id, text);
                true
            }
            None => false,
        }
    }

    pub fn set_inner_html(&mut self, selector: &str, html: &str) -> bool {
        match self.resolve(selector) {
            Some(id) => match self.set_inner_html_of(id, html) {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!(selector, error = %err, "failed to parse inner HTML");
                    false
                }
            },
            None => false,
        }
    }

    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> bool {
        match self.resolve(selector) {
            Some(id) => {
                self.set_attribute_of(id, name, value);
                true
            }
            None => false,
        }
    }

    pub fn serialize(&self) -> String {
        if !self.is_modified() {
            return self.source.clone();
        }
        LosslessSerializer::new(&self.source, &self.nodes).serialize(self.root)
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Old &amp; busted</title></head>
<body>
  <section id="hero" class="hero"><h1>Old</h1><p class="hero-subtitle">Sub</p></section>
  <div class="faq">
    <div class="faq-item"><h3 class="faq-question">Q1</h3></div>
    <div class="faq-item"><h3 class="faq-question">Q2</h3></div>
  </div>
</body>
</html>
"#;

    #[test]
    fn test_get_text_decodes_entities() {
        let doc = parse(PAGE).unwrap();
        assert_eq!(doc.get_text("title"), "Old & busted");
        assert_eq!(doc.get_text("#hero h1"), "Old");
    }

    #[test]
    fn test_missing_selector_is_empty() {
        let mut doc = parse(PAGE).unwrap();
        assert_eq!(doc.get_text(".missing"), "");
        assert_eq!(doc.get_attribute(".missing", "href"), "");
        assert!(!doc.set_text(".missing", "x"));
        assert_eq!(doc.serialize(), PAGE);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = parse(PAGE).unwrap();
        assert!(!doc.selector_exists("div >"));
        assert_eq!(doc.count_matches("%%"), 0);
    }

    #[test]
    fn test_hero_heading_changes_only_its_bytes() {
        let mut doc = parse(PAGE).unwrap();
        assert!(doc.set_text("#hero h1", "New"));
        let out = doc.serialize();
        assert_eq!(out, PAGE.replace("<h1>Old</h1>", "<h1>New</h1>"));
    }

    #[test]
    fn test_equal_write_is_a_no_op() {
        let mut doc = parse(PAGE).unwrap();
        let h1 = doc.query_selector("h1").unwrap();
        assert!(!doc.set_text_of(h1, "Old"));
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_count_and_nth_of_type() {
        let doc = parse(PAGE).unwrap();
        assert_eq!(doc.count_matches(".faq-item"), 2);
        assert_eq!(
            doc.get_text(".faq-item:nth-of-type(2) .faq-question"),
            "Q2"
        );
    }

    #[test]
    fn test_multiline_text_uses_line_breaks() {
        let mut doc = parse("<p class=\"body\">x</p>").unwrap();
        let p = doc.query_selector(".body").unwrap();
        assert!(doc.set_multiline_text_of(p, "one\ntwo & three"));
        assert_eq!(doc.serialize(), "<p class=\"body\">one<br>two &amp; three</p>");
        assert!(!doc.set_multiline_text_of(p, "one\ntwo & three"));
    }

    #[test]
    fn test_class_toggling() {
        let mut doc = parse("<div class=\"item\"><span hidden>b</span></div>").unwrap();
        let item = doc.query_selector(".item").unwrap();
        assert!(doc.toggle_class(item, "featured", true));
        assert!(!doc.toggle_class(item, "featured", true));
        let badge = doc.query_selector("span").unwrap();
        assert!(doc.set_visible_of(badge, true));
        assert_eq!(
            doc.serialize(),
            "<div class=\"item featured\"><span>b</span></div>"
        );

        assert!(doc.toggle_class(item, "featured", false));
        assert_eq!(doc.serialize(), "<div class=\"item\"><span>b</span></div>");
    }

    #[test]
    fn test_inner_html_assignment() {
        let mut doc = parse("<div id=\"a\"><b>old</b></div>").unwrap();
        assert!(doc.set_inner_html("#a", "<i>new</i> text"));
        assert_eq!(doc.get_inner_html("#a"), "<i>new</i> text");
        assert_eq!(doc.get_text("#a i"), "new");
        assert_eq!(doc.serialize(), "<div id=\"a\"><i>new</i> text</div>");
    }

    #[test]
    fn test_sibling_combinators() {
        let doc = parse("<ul><li class=a>1</li><li>2</li><li>3</li></ul>").unwrap();
        assert_eq!(doc.get_text(".a + li"), "2");
        assert_eq!(doc.count_matches(".a ~ li"), 2);
        assert_eq!(doc.get_text("li:last-child"), "3");
        assert_eq!(doc.count_matches("li:not(.a)"), 2);
    }
}
