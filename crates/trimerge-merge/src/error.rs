use trimerge_types::{Path, PathError};

/// Errors that can occur during a merge.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MergeError {
    /// No composed merger could reconcile the values at this path.
    #[error("cannot merge \"{path}\"")]
    Conflict { path: Path },

    /// One input derived the same key twice for a single container.
    #[error("duplicate key {key:?} at \"{path}\"")]
    DuplicateKey { key: String, path: Path },

    /// Left and right imply contradictory positions for the same key.
    #[error("order conflict for key {key:?} at \"{path}\"")]
    OrderConflict { key: String, path: Path },

    /// The merge recursed deeper than the configured limit.
    #[error("merge depth limit {limit} exceeded at \"{path}\"")]
    DepthExceeded { limit: usize, path: Path },

    /// Two mergers were registered for the same route.
    #[error("duplicate route {route}")]
    DuplicateRoute { route: String },

    /// A route pointer could not be parsed.
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] PathError),
}

impl MergeError {
    /// Create an unresolved-conflict error for a path.
    pub fn conflict(path: &Path) -> Self {
        Self::Conflict { path: path.clone() }
    }

    /// The document path the error refers to, if it is path-scoped.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Conflict { path }
            | Self::DuplicateKey { path, .. }
            | Self::OrderConflict { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::DuplicateRoute { .. } | Self::InvalidRoute(_) => None,
        }
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
