//! Byte-level HTML tokenizer.
//!
//! Every byte of the input belongs to exactly one token, in order. The tree
//! builder relies on that to keep node spans contiguous.

use crate::dom::{is_raw_text, Attribute, Span};
use crate::entities;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        tag_tail: String,
        self_closing: bool,
        span: Span,
    },
    EndTag {
        name: String,
        span: Span,
    },
    Text(Span),
    Comment(Span),
    Doctype(Span),
    /// CDATA sections, processing instructions, bogus `<!...>` markup
    Raw(Span),
}

impl Token {
    pub fn span(&self) -> Span {
        match self {
            Token::StartTag { span, .. } | Token::EndTag { span, .. } => *span,
            Token::Text(span) | Token::Comment(span) | Token::Doctype(span) | Token::Raw(span) => {
                *span
            }
        }
    }
}

/// Tokenize a full HTML source
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).run()
}

struct Tokenizer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'src> Tokenizer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'<' && self.starts_markup(self.pos) {
                self.markup();
            } else {
                self.text();
            }
        }
        self.tokens
    }

    fn starts_markup(&self, at: usize) -> bool {
        match self.bytes.get(at + 1) {
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => self
                .bytes
                .get(at + 2)
                .is_some_and(|b| b.is_ascii_alphabetic()),
            Some(b) => b.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn starts_with_ci(&self, at: usize, needle: &str) -> bool {
        self.bytes
            .get(at..at + needle.len())
            .is_some_and(|slice| slice.eq_ignore_ascii_case(needle.as_bytes()))
    }

    fn find_from(&self, at: usize, needle: &str) -> Option<usize> {
        self.source.get(at..)?.find(needle).map(|i| at + i)
    }

    fn text(&mut self) {
        let start = self.pos;
        let first_len = self.source[start..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        let mut cursor = start + first_len;
        loop {
            match self.source[cursor.min(self.bytes.len())..].find('<') {
                Some(offset) => {
                    let at = cursor + offset;
                    if self.starts_markup(at) {
                        self.pos = at;
                        break;
                    }
                    cursor = at + 1;
                }
                None => {
                    self.pos = self.bytes.len();
                    break;
                }
            }
        }
        self.tokens.push(Token::Text(Span::new(start, self.pos)));
    }

    fn markup(&mut self) {
        let start = self.pos;

        if self.starts_with_ci(start, "<!--") {
            let end = self
                .find_from(start + 4, "-->")
                .map(|i| i + 3)
                .unwrap_or(self.bytes.len());
            self.pos = end;
            self.tokens.push(Token::Comment(Span::new(start, end)));
        } else if self.starts_with_ci(start, "<!doctype") {
            let end = self.close_angle(start);
            self.tokens.push(Token::Doctype(Span::new(start, end)));
        } else if self.starts_with_ci(start, "<![cdata[") {
            let end = self
                .find_from(start, "]]>")
                .map(|i| i + 3)
                .unwrap_or(self.bytes.len());
            self.pos = end;
            self.tokens.push(Token::Raw(Span::new(start, end)));
        } else if matches!(self.bytes.get(start + 1), Some(b'!') | Some(b'?')) {
            let end = self.close_angle(start);
            self.tokens.push(Token::Raw(Span::new(start, end)));
        } else if self.bytes.get(start + 1) == Some(&b'/') {
            self.end_tag();
        } else {
            self.start_tag();
        }
    }

    /// Advance past the next `>` and return the new position
    fn close_angle(&mut self, from: usize) -> usize {
        let end = self
            .find_from(from, ">")
            .map(|i| i + 1)
            .unwrap_or(self.bytes.len());
        self.pos = end;
        end
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b'/' || b == b'>' {
                break;
            }
            self.pos += 1;
        }
        self.source[start..self.pos].to_string()
    }

    fn end_tag(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let name = self.read_name();
        let end = self.close_angle(self.pos);
        self.tokens.push(Token::EndTag {
            name,
            span: Span::new(start, end),
        });
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn start_tag(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        let mut ws_start = self.pos;
        let tail_start = loop {
            self.skip_whitespace();

            match self.bytes.get(self.pos) {
                None => break ws_start,
                Some(b'>') => break ws_start,
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self_closing = true;
                    break ws_start;
                }
                Some(b'/') => {
                    // Stray slash; it ends up in the next attribute's leading text
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let attr_start = self.pos;
            while let Some(&b) = self.bytes.get(self.pos) {
                if b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/' {
                    break;
                }
                self.pos += 1;
            }
            let attr_name = self.source[attr_start..self.pos].to_string();

            let mut value = None;
            let mut quote = None;
            let before_eq = self.pos;
            self.skip_whitespace();
            if self.bytes.get(self.pos) == Some(&b'=') {
                self.pos += 1;
                self.skip_whitespace();
                let (raw_value, q) = self.attribute_value();
                value = Some(entities::decode(raw_value).into_owned());
                quote = q;
            } else {
                // Bare attribute; whitespace after it belongs to the next one
                self.pos = before_eq;
            }

            attrs.push(Attribute {
                name: attr_name,
                value,
                quote,
                leading: self.source[ws_start..attr_start].to_string(),
                raw: Some(self.source[attr_start..self.pos].to_string()),
            });
            ws_start = self.pos;
        };

        let end = self.close_angle(tail_start);
        let tag_tail = self.source[tail_start..end].to_string();
        let span = Span::new(start, end);
        let local = name.to_ascii_lowercase();

        self.tokens.push(Token::StartTag {
            name,
            attrs,
            tag_tail,
            self_closing,
            span,
        });

        if is_raw_text(&local) && !self_closing {
            self.raw_text(&local);
        }
    }

    fn attribute_value(&mut self) -> (&'src str, Option<char>) {
        let source = self.source;
        match self.bytes.get(self.pos) {
            Some(&q @ (b'"' | b'\'')) => {
                let value_start = self.pos + 1;
                let value_end = source[value_start..]
                    .find(q as char)
                    .map(|i| value_start + i)
                    .unwrap_or(self.bytes.len());
                self.pos = (value_end + 1).min(self.bytes.len());
                (&source[value_start..value_end], Some(q as char))
            }
            _ => {
                let value_start = self.pos;
                while let Some(&b) = self.bytes.get(self.pos) {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                (&source[value_start..self.pos], None)
            }
        }
    }

    /// Consume everything up to the matching end tag as one text token
    fn raw_text(&mut self, local: &str) {
        let start = self.pos;
        let closing = format!("</{}", local);
        let mut cursor = start;
        let end = loop {
            match self.source[cursor..].find("</") {
                Some(offset) => {
                    let at = cursor + offset;
                    if self.starts_with_ci(at, &closing) {
                        break at;
                    }
                    cursor = at + 2;
                }
                None => break self.bytes.len(),
            }
        };

        if end > start {
            self.tokens.push(Token::Text(Span::new(start, end)));
        }
        self.pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_cover(source: &str, tokens: &[Token]) -> bool {
        let mut pos = 0;
        for token in tokens {
            let span = token.span();
            if span.start != pos {
                return false;
            }
            pos = span.end;
        }
        pos == source.len()
    }

    #[test]
    fn test_tokenize_basic_document() {
        let source = "<!DOCTYPE html><html><body><p class=\"x\">Hi</p></body></html>";
        let tokens = tokenize(source);
        assert!(spans_cover(source, &tokens));
        assert!(matches!(tokens[0], Token::Doctype(_)));
        assert!(matches!(&tokens[1], Token::StartTag { name, .. } if name == "html"));
    }

    #[test]
    fn test_attribute_forms() {
        let source = r#"<input type=text disabled value='a &amp; b' data-x = "y">"#;
        let tokens = tokenize(source);
        let Token::StartTag { attrs, .. } = &tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0].value.as_deref(), Some("text"));
        assert_eq!(attrs[0].quote, None);
        assert_eq!(attrs[1].value, None);
        assert_eq!(attrs[2].value.as_deref(), Some("a & b"));
        assert_eq!(attrs[2].quote, Some('\''));
        assert_eq!(attrs[3].raw.as_deref(), Some(r#"data-x = "y""#));
    }

    #[test]
    fn test_raw_text_elements_are_opaque() {
        let source = "<script>if (a < b) { x = '</div>'; }</script>";
        let tokens = tokenize(source);
        assert!(spans_cover(source, &tokens));
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[1], Token::Text(_)));
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let source = "a < b <3 c";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 1);
        assert!(spans_cover(source, &tokens));
    }

    #[test]
    fn test_unterminated_markup_runs_to_end() {
        for source in ["<!-- open", "<div class=\"x", "<p>text</p", "<![CDATA[ x"] {
            let tokens = tokenize(source);
            assert!(spans_cover(source, &tokens), "gap in {source:?}");
        }
    }
}
