use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("invalid escape sequence in path segment {segment:?}")]
    InvalidEscape { segment: String },
}
