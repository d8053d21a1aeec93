use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::MergeResult;
use crate::merger::{Merger, Outcome};

type Predicate<V> = Box<dyn Fn(&V, &V) -> bool + Send + Sync>;

/// Resolves nodes where at most one side changed.
///
/// If left equals right, keeps left. If base equals left, only right changed
/// and right is kept; if base equals right, left is kept. Anything else is
/// not applicable. Absent values are equal only to each other.
pub struct EqualityMerger<V> {
    name: String,
    predicate: Predicate<V>,
}

impl<V: PartialEq + 'static> EqualityMerger<V> {
    /// Compare values with `PartialEq`.
    pub fn deep() -> Self {
        Self::with_name("equality", |a: &V, b: &V| a == b)
    }
}

impl<V: 'static> EqualityMerger<V> {
    /// Compare values by reference only.
    pub fn strict() -> Self {
        Self::with_name("strict-equality", |a: &V, b: &V| std::ptr::eq(a, b))
    }

    /// Compare values with a custom predicate.
    pub fn new(predicate: impl Fn(&V, &V) -> bool + Send + Sync + 'static) -> Self {
        Self::with_name("custom-equality", predicate)
    }

    fn with_name(name: &str, predicate: impl Fn(&V, &V) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            predicate: Box::new(predicate),
        }
    }

    fn equal(&self, a: Option<&V>, b: Option<&V>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => std::ptr::eq(a, b) || (self.predicate)(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<V: Clone + 'static> Merger<V> for EqualityMerger<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        _path: &Path,
        _dispatcher: &Dispatcher<V>,
    ) -> MergeResult<Outcome<'a, V>> {
        if self.equal(left, right) {
            return Ok(Outcome::input(left));
        }
        if self.equal(base, left) {
            return Ok(Outcome::input(right));
        }
        if self.equal(base, right) {
            return Ok(Outcome::input(left));
        }
        Ok(Outcome::NotApplicable)
    }
}
