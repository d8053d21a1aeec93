use std::borrow::Cow;

use tracing::{debug, trace};
use trimerge_types::Path;

use crate::error::{MergeError, MergeResult};
use crate::merger::{Merger, Outcome};

/// Default limit on nesting depth for a single merge.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The composed merge driver: an ordered chain of [`Merger`]s.
///
/// For every node the dispatcher first checks whether left and right are the
/// same value by identity (the same reference, or both absent) and keeps it
/// without consulting any merger. Otherwise mergers run in order and the
/// first applicable outcome wins. When every merger declines, the node is an
/// unresolved conflict and the whole merge fails with its path.
///
/// Container mergers call back into the dispatcher for their children, so a
/// single chain handles arbitrarily nested documents.
pub struct Dispatcher<V: Clone> {
    mergers: Vec<Box<dyn Merger<V>>>,
    max_depth: usize,
}

impl<V: Clone> Default for Dispatcher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Dispatcher<V> {
    /// An empty chain. Every non-identical input is a conflict until
    /// mergers are added.
    pub fn new() -> Self {
        Self {
            mergers: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A chain of the given mergers, tried in order.
    pub fn combine(mergers: Vec<Box<dyn Merger<V>>>) -> Self {
        Self {
            mergers,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Builder form of [`Self::add_merger`].
    pub fn with_merger(mut self, merger: impl Merger<V> + 'static) -> Self {
        self.add_merger(Box::new(merger));
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Append a merger to the end of the chain.
    pub fn add_merger(&mut self, merger: Box<dyn Merger<V>>) {
        self.mergers.push(merger);
    }

    /// Number of mergers in the chain.
    pub fn merger_count(&self) -> usize {
        self.mergers.len()
    }

    /// Names of the mergers, in chain order.
    pub fn merger_names(&self) -> Vec<&str> {
        self.mergers.iter().map(|merger| merger.name()).collect()
    }

    /// The configured depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Merge three versions of a document root.
    ///
    /// Returns `None` when the merge deletes the root, which only custom
    /// mergers can produce.
    pub fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
    ) -> MergeResult<Option<Cow<'a, V>>> {
        self.merge_at(base, left, right, &Path::root())
    }

    /// Merge three versions of the node at `path`.
    pub fn merge_at<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        path: &Path,
    ) -> MergeResult<Option<Cow<'a, V>>> {
        if path.len() > self.max_depth {
            return Err(MergeError::DepthExceeded {
                limit: self.max_depth,
                path: path.clone(),
            });
        }

        match (left, right) {
            (Some(l), Some(r)) if std::ptr::eq(l, r) => return Ok(Some(Cow::Borrowed(l))),
            (None, None) => return Ok(None),
            _ => {}
        }

        for merger in &self.mergers {
            if let Outcome::Merged(value) = merger.merge(base, left, right, path, self)? {
                trace!(path = %path, merger = merger.name(), "merged node");
                return Ok(value);
            }
        }

        debug!(path = %path, mergers = self.mergers.len(), "no merger applies");
        Err(MergeError::conflict(path))
    }
}
