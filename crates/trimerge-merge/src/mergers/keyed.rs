use std::fmt;
use std::hash::Hash;

use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::MergeResult;
use crate::keyed::{merge_keyed, KeyedEntries, KeyedMerge};
use crate::merger::{Merger, Outcome};

/// How a keyed container looks inside a value type.
///
/// A shape recognizes containers, lists their `(key, child)` entries in
/// container order, and rebuilds a container from merged entries.
pub trait KeyedShape<V: Clone>: Send + Sync {
    /// Identity of a child within its container.
    type Key: Clone + Eq + Hash + fmt::Display + fmt::Debug;

    /// Name reported by the merger built on this shape.
    fn name(&self) -> &str;

    /// The entries of `value`, or `None` if it is not this kind of container.
    fn entries<'a>(&self, value: &'a V, path: &Path) -> Option<Vec<(Self::Key, &'a V)>>;

    /// Build a container from merged entries.
    fn build(&self, entries: Vec<(Self::Key, V)>) -> V;

    /// Whether a missing base counts as an empty container. Otherwise the
    /// merger declines when the base is absent.
    fn absent_base_is_empty(&self) -> bool {
        false
    }
}

/// Merges containers of one shape key by key.
///
/// Applies only when base, left and right are all containers of the shape
/// (the base may be absent if the shape allows it). Children are merged
/// through the full dispatcher and the key order is reconciled three-way.
/// When the result matches one side exactly, that side is returned by
/// reference.
pub struct KeyedMerger<S> {
    shape: S,
    allow_order_conflicts: bool,
}

impl<S> KeyedMerger<S> {
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            allow_order_conflicts: false,
        }
    }

    /// Resolve contradictory moves first-wins instead of failing.
    pub fn allow_order_conflicts(mut self, allow: bool) -> Self {
        self.allow_order_conflicts = allow;
        self
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }
}

impl<S: Default> Default for KeyedMerger<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<V, S> Merger<V> for KeyedMerger<S>
where
    V: Clone,
    S: KeyedShape<V>,
{
    fn name(&self) -> &str {
        self.shape.name()
    }

    fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        path: &Path,
        dispatcher: &Dispatcher<V>,
    ) -> MergeResult<Outcome<'a, V>> {
        let (Some(left), Some(right)) = (left, right) else {
            return Ok(Outcome::NotApplicable);
        };
        let (Some(left_entries), Some(right_entries)) =
            (self.shape.entries(left, path), self.shape.entries(right, path))
        else {
            return Ok(Outcome::NotApplicable);
        };
        let base_entries = match base {
            Some(base) => match self.shape.entries(base, path) {
                Some(entries) => entries,
                None => return Ok(Outcome::NotApplicable),
            },
            None if self.shape.absent_base_is_empty() => Vec::new(),
            None => return Ok(Outcome::NotApplicable),
        };

        let entries = KeyedEntries {
            base: base_entries,
            left: left_entries,
            right: right_entries,
        };
        Ok(
            match merge_keyed(entries, path, dispatcher, self.allow_order_conflicts)? {
                KeyedMerge::Left => Outcome::borrowed(left),
                KeyedMerge::Right => Outcome::borrowed(right),
                KeyedMerge::Merged(entries) => Outcome::owned(self.shape.build(entries)),
            },
        )
    }
}
