//! # CSS selectors
//!
//! A compact selector engine covering what page templates actually use:
//! type/universal, `#id`, `.class`, attribute tests, structural pseudo-classes,
//! `:not(...)`, the four combinators and comma lists.
//!
//! Matching runs right-to-left against the arena, so a selector such as
//! `#hero h1` evaluated inside a subtree still sees ancestors outside of it
//! (same semantics as `Element.querySelectorAll`).

use crate::document::HtmlDocument;
use crate::dom::{ElementData, NodeId};
use crate::error::SelectorError;
use crate::selector_lexer::{tokenize_selector, SelectorToken};
use std::fmt;
use std::ops::Range;

/// Comma-separated list of complex selectors
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored left to right
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    /// Lowercased tag name; `None` means any element
    pub tag: Option<String>,
    pub filters: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        test: Option<(AttributeOp, String)>,
    },
    Pseudo(PseudoClass),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    FirstOfType,
    LastOfType,
    NthChild(Nth),
    NthOfType(Nth),
    Not(Box<CompoundSelector>),
}

/// `an+b` position expression (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    pub fn parse(expr: &str) -> Result<Self, SelectorError> {
        let compact: String = expr
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || SelectorError::InvalidNth(expr.to_string());

        match compact.as_str() {
            "odd" => return Ok(Self { a: 2, b: 1 }),
            "even" => return Ok(Self { a: 2, b: 0 }),
            "" => return Err(invalid()),
            _ => {}
        }

        match compact.find('n') {
            None => {
                let b = compact.parse::<i32>().map_err(|_| invalid())?;
                Ok(Self { a: 0, b })
            }
            Some(n_at) => {
                let a = match &compact[..n_at] {
                    "" | "+" => 1,
                    "-" => -1,
                    digits => digits.parse::<i32>().map_err(|_| invalid())?,
                };
                let rest = &compact[n_at + 1..];
                let b = if rest.is_empty() {
                    0
                } else {
                    rest.trim_start_matches('+')
                        .parse::<i32>()
                        .map_err(|_| invalid())?
                };
                Ok(Self { a, b })
            }
        }
    }

    /// Does the 1-based `position` satisfy `an+b` for some n >= 0
    pub fn matches(&self, position: i32) -> bool {
        if self.a == 0 {
            return position == self.b;
        }
        let (a, diff) = (i64::from(self.a), i64::from(position) - i64::from(self.b));
        diff % a == 0 && diff / a >= 0
    }
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        SelectorParser::new(source)?.parse_list()
    }

    /// Does the element `id` match any selector in the list
    pub fn matches(&self, doc: &HtmlDocument, id: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, id))
    }
}

impl ComplexSelector {
    pub fn matches(&self, doc: &HtmlDocument, id: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            len => self.matches_at(doc, len - 1, id),
        }
    }

    fn matches_at(&self, doc: &HtmlDocument, index: usize, id: NodeId) -> bool {
        if !self.compounds[index].matches(doc, id) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Descendant => {
                let mut cursor = doc.parent_element(id);
                while let Some(ancestor) = cursor {
                    if self.matches_at(doc, index - 1, ancestor) {
                        return true;
                    }
                    cursor = doc.parent_element(ancestor);
                }
                false
            }
            Combinator::Child => doc
                .parent_element(id)
                .is_some_and(|parent| self.matches_at(doc, index - 1, parent)),
            Combinator::NextSibling => doc
                .previous_element_sibling(id)
                .is_some_and(|prev| self.matches_at(doc, index - 1, prev)),
            Combinator::SubsequentSibling => {
                let mut cursor = doc.previous_element_sibling(id);
                while let Some(prev) = cursor {
                    if self.matches_at(doc, index - 1, prev) {
                        return true;
                    }
                    cursor = doc.previous_element_sibling(prev);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    pub fn matches(&self, doc: &HtmlDocument, id: NodeId) -> bool {
        let Some(data) = doc.node(id).element() else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if data.local != *tag {
                return false;
            }
        }

        self.filters
            .iter()
            .all(|filter| filter.matches(doc, id, data))
    }
}

impl SimpleSelector {
    fn matches(&self, doc: &HtmlDocument, id: NodeId, data: &ElementData) -> bool {
        match self {
            SimpleSelector::Id(expected) => data.id() == Some(expected.as_str()),
            SimpleSelector::Class(class) => data.has_class(class),
            SimpleSelector::Attribute { name, test } => {
                let Some(value) = data.attr_value(name) else {
                    return false;
                };
                match test {
                    None => true,
                    Some((op, expected)) => op.test(value, expected),
                }
            }
            SimpleSelector::Pseudo(pseudo) => pseudo.matches(doc, id, data),
        }
    }
}

impl AttributeOp {
    fn test(self, value: &str, expected: &str) -> bool {
        match self {
            AttributeOp::Equals => value == expected,
            AttributeOp::Includes => value.split_ascii_whitespace().any(|v| v == expected),
            AttributeOp::DashMatch => {
                value == expected
                    || value
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttributeOp::Substring => !expected.is_empty() && value.contains(expected),
        }
    }
}

impl PseudoClass {
    fn matches(&self, doc: &HtmlDocument, id: NodeId, data: &ElementData) -> bool {
        match self {
            PseudoClass::FirstChild => doc.previous_element_sibling(id).is_none(),
            PseudoClass::LastChild => doc.next_element_sibling(id).is_none(),
            PseudoClass::FirstOfType => position_of_type(doc, id, &data.local, false) == 1,
            PseudoClass::LastOfType => position_of_type(doc, id, &data.local, true) == 1,
            PseudoClass::NthChild(nth) => nth.matches(element_position(doc, id)),
            PseudoClass::NthOfType(nth) => {
                nth.matches(position_of_type(doc, id, &data.local, false))
            }
            PseudoClass::Not(inner) => !inner.matches(doc, id),
        }
    }
}

fn element_position(doc: &HtmlDocument, id: NodeId) -> i32 {
    let mut position = 1;
    let mut cursor = doc.previous_element_sibling(id);
    while let Some(prev) = cursor {
        position += 1;
        cursor = doc.previous_element_sibling(prev);
    }
    position
}

fn position_of_type(doc: &HtmlDocument, id: NodeId, local: &str, from_end: bool) -> i32 {
    let mut position = 1;
    let step = |n: NodeId| {
        if from_end {
            doc.next_element_sibling(n)
        } else {
            doc.previous_element_sibling(n)
        }
    };
    let mut cursor = step(id);
    while let Some(sibling) = cursor {
        if doc.node(sibling).local_name() == Some(local) {
            position += 1;
        }
        cursor = step(sibling);
    }
    position
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, " > "),
            Combinator::NextSibling => write!(f, " + "),
            Combinator::SubsequentSibling => write!(f, " ~ "),
        }
    }
}

/// Recursive-descent parser over lexed selector tokens
struct SelectorParser<'src> {
    source: &'src str,
    tokens: Vec<(SelectorToken<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> SelectorParser<'src> {
    fn new(source: &'src str) -> Result<Self, SelectorError> {
        let tokens = tokenize_selector(source)
            .map_err(|pos| {
            let found = source[pos..].chars().next().map(String::from).unwrap_or_default();
            SelectorError::unexpected_token(pos, found)
        })?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&SelectorToken<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(SelectorToken<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.peek(), Some(SelectorToken::Whitespace)) {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    fn error_here(&self) -> SelectorError {
        match self.tokens.get(self.pos) {
            Some((token, span)) => SelectorError::unexpected_token(span.start, token.to_string()),
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                Some(SelectorToken::Comma) => {
                    self.pos += 1;
                }
                None => break,
                Some(_) => return Err(self.error_here()),
            }
        }

        if selectors.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some(SelectorToken::Child) => Combinator::Child,
                Some(SelectorToken::Plus) => Combinator::NextSibling,
                Some(SelectorToken::Tilde) => Combinator::SubsequentSibling,
                Some(SelectorToken::Comma) | None => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.error_here()),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::default();
        let mut consumed = false;

        match self.peek() {
            Some(SelectorToken::Ident(name)) => {
                compound.tag = Some(name.to_ascii_lowercase());
                self.pos += 1;
                consumed = true;
            }
            Some(SelectorToken::Star) => {
                self.pos += 1;
                consumed = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(SelectorToken::Hash) => {
                    self.pos += 1;
                    let name = self.expect_name()?;
                    compound.filters.push(SimpleSelector::Id(name));
                }
                Some(SelectorToken::Dot) => {
                    self.pos += 1;
                    let name = self.expect_name()?;
                    compound.filters.push(SimpleSelector::Class(name));
                }
                Some(SelectorToken::LBracket) => {
                    self.pos += 1;
                    compound.filters.push(self.parse_attribute()?);
                }
                Some(SelectorToken::Colon) => {
                    self.pos += 1;
                    compound
                        .filters
                        .push(SimpleSelector::Pseudo(self.parse_pseudo()?));
                }
                _ => break,
            }
            consumed = true;
        }

        if !consumed {
            return Err(self.error_here());
        }
        Ok(compound)
    }

    fn expect_name(&mut self) -> Result<String, SelectorError> {
        match self.advance() {
            Some((SelectorToken::Ident(name), _)) | Some((SelectorToken::Number(name), _)) => {
                Ok(name.to_string())
            }
            Some((token, span)) => Err(SelectorError::unexpected_token(span.start, token.to_string())),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.expect_name()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.advance() {
            Some((SelectorToken::RBracket, _)) => {
                return Ok(SimpleSelector::Attribute { name, test: None });
            }
            Some((SelectorToken::Equals, _)) => AttributeOp::Equals,
            Some((SelectorToken::Includes, _)) => AttributeOp::Includes,
            Some((SelectorToken::DashMatch, _)) => AttributeOp::DashMatch,
            Some((SelectorToken::PrefixMatch, _)) => AttributeOp::Prefix,
            Some((SelectorToken::SuffixMatch, _)) => AttributeOp::Suffix,
            Some((SelectorToken::SubstringMatch, _)) => AttributeOp::Substring,
            Some((token, span)) => {
                return Err(SelectorError::unexpected_token(span.start, token.to_string()))
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };

        self.skip_whitespace();
        let value = match self.advance() {
            Some((SelectorToken::String(quoted), _)) => unquote(quoted),
            Some((SelectorToken::Ident(v), _)) | Some((SelectorToken::Number(v), _)) => v.to_string(),
            Some((token, span)) => {
                return Err(SelectorError::unexpected_token(span.start, token.to_string()))
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_whitespace();

        match self.advance() {
            Some((SelectorToken::RBracket, _)) => Ok(SimpleSelector::Attribute {
                name,
                test: Some((op, value)),
            }),
            Some((token, span)) => Err(SelectorError::unexpected_token(span.start, token.to_string())),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass, SelectorError> {
        let name = self.expect_name()?.to_ascii_lowercase();

        let takes_argument = matches!(name.as_str(), "nth-child" | "nth-of-type" | "not");
        if !takes_argument {
            return match name.as_str() {
                "first-child" => Ok(PseudoClass::FirstChild),
                "last-child" => Ok(PseudoClass::LastChild),
                "first-of-type" => Ok(PseudoClass::FirstOfType),
                "last-of-type" => Ok(PseudoClass::LastOfType),
                _ => Err(SelectorError::UnsupportedPseudo(name)),
            };
        }

        let argument = self.parenthesized()?;
        match name.as_str() {
            "nth-child" => Ok(PseudoClass::NthChild(Nth::parse(argument)?)),
            "nth-of-type" => Ok(PseudoClass::NthOfType(Nth::parse(argument)?)),
            _ => {
                let mut inner = SelectorParser::new(argument)?;
                inner.skip_whitespace();
                let compound = inner.parse_compound()?;
                inner.skip_whitespace();
                if inner.peek().is_some() {
                    return Err(inner.error_here());
                }
                Ok(PseudoClass::Not(Box::new(compound)))
            }
        }
    }

    /// Consume `( ... )` and return the raw source between the parentheses
    fn parenthesized(&mut self) -> Result<&'src str, SelectorError> {
        let open = match self.advance() {
            Some((SelectorToken::LParen, span)) => span,
            Some((token, span)) => {
                return Err(SelectorError::unexpected_token(span.start, token.to_string()))
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };

        let mut depth = 1;
        while let Some((token, span)) = self.advance() {
            match token {
                SelectorToken::LParen => depth += 1,
                SelectorToken::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.source[open.end..span.start]);
                    }
                }
                _ => {}
            }
        }
        Err(SelectorError::UnexpectedEnd)
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descendant_and_child() {
        let list = SelectorList::parse("#hero h1, .team > .team-member").unwrap();
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(list.selectors[0].combinators, vec![Combinator::Descendant]);
        assert_eq!(list.selectors[1].combinators, vec![Combinator::Child]);
        assert_eq!(
            list.selectors[0].compounds[0].filters,
            vec![SimpleSelector::Id("hero".into())]
        );
    }

    #[test]
    fn test_parse_attribute_selector() {
        let list = SelectorList::parse(r#"meta[name="description"]"#).unwrap();
        let compound = &list.selectors[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("meta"));
        assert_eq!(
            compound.filters[0],
            SimpleSelector::Attribute {
                name: "name".into(),
                test: Some((AttributeOp::Equals, "description".into())),
            }
        );
    }

    #[test]
    fn test_parse_nth_of_type() {
        let list = SelectorList::parse(".faq-item:nth-of-type(2) .faq-question").unwrap();
        let first = &list.selectors[0].compounds[0];
        assert_eq!(
            first.filters[1],
            SimpleSelector::Pseudo(PseudoClass::NthOfType(Nth { a: 0, b: 2 }))
        );
    }

    #[test]
    fn test_nth_expressions() {
        assert_eq!(Nth::parse("odd").unwrap(), Nth { a: 2, b: 1 });
        assert_eq!(Nth::parse("2n+1").unwrap(), Nth { a: 2, b: 1 });
        assert_eq!(Nth::parse("-n + 3").unwrap(), Nth { a: -1, b: 3 });
        assert_eq!(Nth::parse("n").unwrap(), Nth { a: 1, b: 0 });
        assert!(Nth::parse("x").is_err());

        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1));
        assert!(first_three.matches(3));
        assert!(!first_three.matches(4));

        let even = Nth { a: 2, b: 0 };
        assert!(even.matches(2));
        assert!(!even.matches(3));
    }

    #[test]
    fn test_nth_extreme_coefficients() {
        let far = Nth::parse("-n-2147483648").unwrap();
        assert!(!far.matches(1));
        assert!(!far.matches(i32::MAX));

        let huge_step = Nth { a: i32::MIN, b: i32::MAX };
        assert!(huge_step.matches(i32::MAX));
        assert!(!huge_step.matches(0));
    }

    #[test]
    fn test_invalid_selectors() {
        assert_eq!(SelectorList::parse("   "), Err(SelectorError::Empty));
        assert!(SelectorList::parse("div >").is_err());
        assert!(SelectorList::parse("[href").is_err());
        assert!(matches!(
            SelectorList::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo(_))
        ));
    }
}
