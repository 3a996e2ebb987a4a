//! Lossless HTML parsing for Pagesmith.
//!
//! [`parse`] turns markup into an arena [`HtmlDocument`] that can be queried
//! with CSS selectors, edited in place, and serialized back. Untouched markup
//! is reproduced byte-for-byte.

pub mod document;
pub mod dom;
pub mod entities;
pub mod error;
pub mod lossless_serializer;
pub mod parser;
pub mod selector;
pub mod selector_lexer;
pub mod tokenizer;

pub use document::HtmlDocument;
pub use dom::{Attribute, ElementData, Node, NodeId, NodeKind, Span};
pub use error::{ParseError, ParseResult, SelectorError};
pub use parser::parse;
pub use selector::SelectorList;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_roundtrip() {
        let source = "<p>Hello <b>world</b></p>";
        let doc = parse(source).unwrap();
        assert_eq!(doc.serialize(), source);
    }
}
