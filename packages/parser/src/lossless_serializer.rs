use crate::dom::{ElementData, Node, NodeId, NodeKind};
use crate::entities;

/// Lossless serializer that preserves the original markup using spans
///
/// This serializer enables exact roundtrip editing:
/// 1. Parse source → arena with spans
/// 2. Mutate a few nodes (text, attributes, children)
/// 3. Serialize → every untouched byte is copied from the source
///
/// Strategy:
/// - Untouched subtrees: copy original source verbatim
/// - Touched elements: copy or re-render the start tag, then recurse
/// - Re-rendered start tags keep unchanged attributes byte-for-byte
pub struct LosslessSerializer<'a> {
    source: &'a str,
    nodes: &'a [Node],
}

impl<'a> LosslessSerializer<'a> {
    pub fn new(source: &'a str, nodes: &'a [Node]) -> Self {
        Self { source, nodes }
    }

    /// Serialize the subtree rooted at `id` (including the node itself)
    pub fn serialize(&self, id: NodeId) -> String {
        let mut output = String::with_capacity(self.source.len());
        self.write_node(id, &mut output);
        output
    }

    /// Serialize only the children of `id`
    pub fn serialize_children(&self, id: NodeId) -> String {
        let mut output = String::new();
        for child in &self.nodes[id.0].children {
            self.write_node(*child, &mut output);
        }
        output
    }

    fn write_node(&self, id: NodeId, output: &mut String) {
        let node = &self.nodes[id.0];

        if !node.touched {
            if let Some(span) = node.span {
                output.push_str(&self.source[span.range()]);
                return;
            }
        }

        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(*child, output);
                }
            }
            NodeKind::Text(text)
            | NodeKind::Comment(text)
            | NodeKind::Doctype(text)
            | NodeKind::Raw(text) => output.push_str(text),
            NodeKind::Element(data) => {
                match node.start_tag {
                    Some(span) if !node.tag_dirty => output.push_str(&self.source[span.range()]),
                    _ => render_start_tag(data, output),
                }

                for child in &node.children {
                    self.write_node(*child, output);
                }

                match node.end_tag {
                    Some(span) => output.push_str(&self.source[span.range()]),
                    None if data.has_end_tag => {
                        output.push_str("</");
                        output.push_str(&data.name);
                        output.push('>');
                    }
                    None => {}
                }
            }
        }
    }
}

/// Render a start tag from element data
pub(crate) fn render_start_tag(data: &ElementData, output: &mut String) {
    output.push('<');
    output.push_str(&data.name);

    for attr in &data.attrs {
        output.push_str(&attr.leading);
        if let Some(raw) = &attr.raw {
            output.push_str(raw);
            continue;
        }

        output.push_str(&attr.name);
        if let Some(value) = &attr.value {
            let quote = attr.quote.unwrap_or('"');
            output.push('=');
            output.push(quote);
            output.push_str(&entities::escape_attribute(value, quote));
            output.push(quote);
        }
    }

    output.push_str(&data.tag_tail);
}
