use crate::document::HtmlDocument;
use crate::dom::{is_void, ElementData, Node, NodeId, NodeKind, Span};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};

/// Maximum element nesting accepted before parsing fails
pub const MAX_DEPTH: usize = 512;

/// Parse an HTML string into an arena document
pub fn parse(source: &str) -> ParseResult<HtmlDocument> {
    if source.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let (nodes, root) = TreeBuilder::new(source).build()?;
    Ok(HtmlDocument::from_parts(source.to_string(), nodes, root))
}

/// Parse a fragment into detached nodes (spans stripped).
///
/// Used by inner-HTML assignment; the returned nodes are appended to `arena`
/// and the ids of the top-level nodes are returned in order.
pub(crate) fn parse_fragment_into(
    fragment: &str,
    arena: &mut Vec<Node>,
) -> ParseResult<Vec<NodeId>> {
    if fragment.is_empty() {
        return Ok(Vec::new());
    }

    let (nodes, root) = TreeBuilder::new(fragment).build()?;
    let offset = arena.len();

    for mut node in nodes {
        node.parent = node.parent.map(|p| NodeId(p.0 + offset));
        for child in node.children.iter_mut() {
            *child = NodeId(child.0 + offset);
        }
        // Spans point into the fragment, not the document source
        node.span = None;
        node.start_tag = None;
        node.end_tag = None;
        node.touched = true;
        arena.push(node);
    }

    let fragment_root = NodeId(root.0 + offset);
    let top: Vec<NodeId> = arena[fragment_root.0].children.clone();
    arena[fragment_root.0].children.clear();
    for id in &top {
        arena[id.0].parent = None;
    }
    Ok(top)
}

/// Returns true when opening `incoming` implicitly closes an open `current`
fn closes_implicitly(current: &str, incoming: &str) -> bool {
    match current {
        "p" => matches!(
            incoming,
            "address"
                | "article"
                | "aside"
                | "blockquote"
                | "details"
                | "div"
                | "dl"
                | "dd"
                | "dt"
                | "fieldset"
                | "figure"
                | "footer"
                | "form"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "header"
                | "hr"
                | "li"
                | "main"
                | "menu"
                | "nav"
                | "ol"
                | "p"
                | "pre"
                | "section"
                | "table"
                | "ul"
        ),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "option" => matches!(incoming, "option" | "optgroup"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        _ => false,
    }
}

struct TreeBuilder<'src> {
    source: &'src str,
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl<'src> TreeBuilder<'src> {
    fn new(source: &'src str) -> Self {
        let root = Node::new(NodeKind::Document);
        Self {
            source,
            nodes: vec![root],
            stack: vec![NodeId(0)],
        }
    }

    fn build(mut self) -> ParseResult<(Vec<Node>, NodeId)> {
        for token in tokenize(self.source) {
            match token {
                Token::StartTag {
                    name,
                    attrs,
                    tag_tail,
                    self_closing,
                    span,
                } => self.start_tag(name, attrs, tag_tail, self_closing, span)?,
                Token::EndTag { name, span } => self.end_tag(&name, span),
                Token::Text(span) => {
                    let text = self.source[span.range()].to_string();
                    self.leaf(NodeKind::Text(text), span);
                }
                Token::Comment(span) => {
                    let text = self.source[span.range()].to_string();
                    self.leaf(NodeKind::Comment(text), span);
                }
                Token::Doctype(span) => {
                    let text = self.source[span.range()].to_string();
                    self.leaf(NodeKind::Doctype(text), span);
                }
                Token::Raw(span) => {
                    let text = self.source[span.range()].to_string();
                    self.leaf(NodeKind::Raw(text), span);
                }
            }
        }

        // Anything still open ends at EOF
        let end = self.source.len();
        while self.stack.len() > 1 {
            self.close_top(end, None);
        }
        self.nodes[0].span = Some(Span::new(0, end));

        Ok((self.nodes, NodeId(0)))
    }

    fn current(&self) -> NodeId {
        // The document root is never popped
        self.stack[self.stack.len() - 1]
    }

    fn push_child(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.current();
        let mut node = node;
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn leaf(&mut self, kind: NodeKind, span: Span) {
        let mut node = Node::new(kind);
        node.span = Some(span);
        self.push_child(node);
    }

    fn start_tag(
        &mut self,
        name: String,
        attrs: Vec<crate::dom::Attribute>,
        tag_tail: String,
        self_closing: bool,
        span: Span,
    ) -> ParseResult<()> {
        let local = name.to_ascii_lowercase();

        while self.stack.len() > 1 {
            let top = self.current();
            let closes = self.nodes[top.0]
                .local_name()
                .is_some_and(|open| closes_implicitly(open, &local));
            if !closes {
                break;
            }
            self.close_top(span.start, None);
        }

        let void = is_void(&local);
        let mut data = ElementData::new(&name);
        data.attrs = attrs;
        data.tag_tail = tag_tail;
        data.self_closing = self_closing;
        data.has_end_tag = false;

        let mut node = Node::new(NodeKind::Element(data));
        node.start_tag = Some(span);
        node.span = Some(span);
        let id = self.push_child(node);

        if !void && !self_closing {
            if self.stack.len() > MAX_DEPTH {
                return Err(ParseError::nesting_too_deep(span.start, MAX_DEPTH));
            }
            self.stack.push(id);
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &str, span: Span) {
        let local = name.to_ascii_lowercase();
        let open_at = self
            .stack
            .iter()
            .rposition(|id| self.nodes[id.0].local_name() == Some(local.as_str()));

        match open_at {
            Some(index) if index > 0 => {
                while self.stack.len() > index + 1 {
                    self.close_top(span.start, None);
                }
                self.close_top(span.end, Some(span));
            }
            _ => {
                // Stray end tag; keep it verbatim
                let text = self.source[span.range()].to_string();
                self.leaf(NodeKind::Raw(text), span);
            }
        }
    }

    /// Pop the current element, ending its outer span at `end`
    fn close_top(&mut self, end: usize, end_tag: Option<Span>) {
        let Some(id) = self.stack.pop() else {
            return;
        };
        let node = &mut self.nodes[id.0];
        let start = node.start_tag.map(|s| s.start).unwrap_or(end);
        node.span = Some(Span::new(start, end));
        node.end_tag = end_tag;
        if let Some(data) = node.element_mut() {
            data.has_end_tag = end_tag.is_some();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(doc: &HtmlDocument, id: NodeId) -> Vec<String> {
        doc.children(id)
            .iter()
            .filter_map(|c| doc.node(*c).local_name().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_parse_nested_structure() {
        let doc = parse("<html><head></head><body><div><p>a</p></div></body></html>").unwrap();
        let html = doc.children(doc.root())[0];
        assert_eq!(element_names(&doc, html), vec!["head", "body"]);
    }

    #[test]
    fn test_implied_paragraph_end() {
        let doc = parse("<div><p>one<p>two</div>").unwrap();
        let div = doc.children(doc.root())[0];
        assert_eq!(element_names(&doc, div), vec!["p", "p"]);
    }

    #[test]
    fn test_implied_list_item_end() {
        let doc = parse("<ul><li>a<li>b<li>c</ul>").unwrap();
        let ul = doc.children(doc.root())[0];
        assert_eq!(element_names(&doc, ul), vec!["li", "li", "li"]);
    }

    #[test]
    fn test_stray_end_tag_is_preserved() {
        let doc = parse("<div>a</span>b</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let kinds: Vec<_> = doc
            .children(div)
            .iter()
            .map(|c| matches!(doc.node(*c).kind, NodeKind::Raw(_)))
            .collect();
        assert_eq!(kinds, vec![false, true, false]);
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let doc = parse("<p>a<br>b<img src=x>c</p>").unwrap();
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 5);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(parse("").unwrap_err(), ParseError::EmptyInput);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "<div>".repeat(MAX_DEPTH + 5);
        assert!(matches!(
            parse(&deep),
            Err(ParseError::NestingTooDeep { .. })
        ));
    }
}
