//! Error types for the diff crate.

use trimerge_types::Path;

/// Errors that can occur while replaying a patch.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DiffError {
    /// A path segment does not resolve to an existing node.
    #[error("path not found: {0}")]
    PathNotFound(Path),

    /// The node at the path has the wrong kind for the operation.
    #[error("unexpected node kind at {path}: expected {expected}")]
    UnexpectedKind { path: Path, expected: String },

    /// A splice reaches outside the target sequence.
    #[error("splice out of range at {path}: index {index} + remove {remove} exceeds length {len}")]
    OutOfRange {
        path: Path,
        index: usize,
        remove: usize,
        len: usize,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
