use logos::Logos;
use std::fmt;

/// Token types for CSS selectors
///
/// Whitespace is significant (descendant combinator), so it is lexed rather
/// than skipped.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum SelectorToken<'src> {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[token(",")]
    Comma,

    #[token(">")]
    Child,

    #[token("+")]
    Plus,

    #[token("~")]
    Tilde,

    #[token("*")]
    Star,

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token("~=")]
    Includes,

    #[token("|=")]
    DashMatch,

    #[token("^=")]
    PrefixMatch,

    #[token("$=")]
    SuffixMatch,

    #[token("*=")]
    SubstringMatch,

    // Identifiers (class names, tags, attribute names, pseudo names)
    #[regex(r"-?[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"-?[0-9]+", |lex| lex.slice())]
    Number(&'src str),

    // Quoted strings, quotes included
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\]|\\.)*'", |lex| lex.slice())]
    String(&'src str),
}

impl fmt::Display for SelectorToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorToken::Whitespace => write!(f, "whitespace"),
            SelectorToken::Comma => write!(f, ","),
            SelectorToken::Child => write!(f, ">"),
            SelectorToken::Plus => write!(f, "+"),
            SelectorToken::Tilde => write!(f, "~"),
            SelectorToken::Star => write!(f, "*"),
            SelectorToken::Dot => write!(f, "."),
            SelectorToken::Hash => write!(f, "#"),
            SelectorToken::LBracket => write!(f, "["),
            SelectorToken::RBracket => write!(f, "]"),
            SelectorToken::LParen => write!(f, "("),
            SelectorToken::RParen => write!(f, ")"),
            SelectorToken::Colon => write!(f, ":"),
            SelectorToken::Equals => write!(f, "="),
            SelectorToken::Includes => write!(f, "~="),
            SelectorToken::DashMatch => write!(f, "|="),
            SelectorToken::PrefixMatch => write!(f, "^="),
            SelectorToken::SuffixMatch => write!(f, "$="),
            SelectorToken::SubstringMatch => write!(f, "*="),
            SelectorToken::Ident(s) | SelectorToken::Number(s) | SelectorToken::String(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

/// Tokenize a selector, returning tokens with their byte ranges.
///
/// Unrecognized input is reported as `Err(position)`.
pub fn tokenize_selector(
    source: &str,
) -> Result<Vec<(SelectorToken<'_>, std::ops::Range<usize>)>, usize> {
    let mut lexer = SelectorToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span().start),
        }
    }

    Ok(tokens)
}
