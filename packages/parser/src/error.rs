use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal HTML parse failures.
///
/// The tokenizer is tolerant of almost any markup, so these only fire on input
/// that cannot describe a document at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("HTML input is empty")]
    EmptyInput,

    #[error("Element nesting exceeds {limit} levels at byte {pos}")]
    NestingTooDeep { pos: usize, limit: usize },
}

impl ParseError {
    pub fn nesting_too_deep(pos: usize, limit: usize) -> Self {
        Self::NestingTooDeep { pos, limit }
    }
}

/// Errors produced while compiling a CSS selector string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected token at {pos} in selector: {found}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("Unexpected end of selector")]
    UnexpectedEnd,

    #[error("Unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),

    #[error("Invalid nth expression: {0}")]
    InvalidNth(String),
}

impl SelectorError {
    pub fn unexpected_token(pos: usize, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            found: found.into(),
        }
    }
}
