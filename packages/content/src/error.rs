use pagesmith_parser::ParseError;
use thiserror::Error;

/// Fatal injection failures. Missing selectors and unknown section types are
/// reported as warnings instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InjectError {
    #[error("Failed to parse HTML template: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown extraction mode: {0}")]
pub struct UnknownExtractMode(pub String);
