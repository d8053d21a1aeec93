use std::borrow::Cow;
use std::marker::PhantomData;

use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::MergeResult;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a single merger made of its inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<'a, V: Clone> {
    /// The merger handled the inputs. `None` removes the value from its
    /// parent container.
    Merged(Option<Cow<'a, V>>),
    /// The merger does not handle this shape; the dispatcher tries the next.
    NotApplicable,
}

impl<'a, V: Clone> Outcome<'a, V> {
    /// Merged to one of the inputs, kept by reference.
    pub fn borrowed(value: &'a V) -> Self {
        Self::Merged(Some(Cow::Borrowed(value)))
    }

    /// Merged to a freshly built value.
    pub fn owned(value: V) -> Self {
        Self::Merged(Some(Cow::Owned(value)))
    }

    /// Merged to "absent": the key is dropped from its container.
    pub fn deleted() -> Self {
        Self::Merged(None)
    }

    /// Merged to whichever input `value` is (present or absent).
    pub fn input(value: Option<&'a V>) -> Self {
        Self::Merged(value.map(Cow::Borrowed))
    }

    /// Returns `true` unless this is [`Outcome::NotApplicable`].
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

// ---------------------------------------------------------------------------
// Merger trait
// ---------------------------------------------------------------------------

/// One strategy in a [`Dispatcher`] chain.
///
/// A merger receives the three versions of a node (`None` where the node is
/// missing from its parent), the node's path, and the full dispatcher so it
/// can merge children through the complete chain. It returns
/// [`Outcome::NotApplicable`] for inputs it does not understand.
///
/// The trait is object-safe and `Send + Sync` so mergers can be stored in a
/// `Vec<Box<dyn Merger<V>>>` and shared across threads.
pub trait Merger<V: Clone>: Send + Sync {
    /// Human-readable name of this merger (e.g., "equality", "object").
    fn name(&self) -> &str;

    /// Merge one node.
    fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        path: &Path,
        dispatcher: &Dispatcher<V>,
    ) -> MergeResult<Outcome<'a, V>>;
}

// ---------------------------------------------------------------------------
// Closure adapter
// ---------------------------------------------------------------------------

/// A [`Merger`] backed by a closure. Created by [`merger_fn`].
pub struct FnMerger<V, F> {
    name: String,
    merge: F,
    _value: PhantomData<fn() -> V>,
}

/// Wrap a closure as a named merger.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Value};
/// use trimerge_merge::{merger_fn, Dispatcher, Outcome};
///
/// // Resolve every conflict in favor of the left side.
/// let prefer_left = merger_fn(
///     "prefer-left",
///     |_base, left: Option<&Value>, _right, _path, _dispatcher| Ok(Outcome::input(left)),
/// );
/// let dispatcher = Dispatcher::new().with_merger(prefer_left);
/// let (base, left, right) = (json!(1), json!(2), json!(3));
/// let merged = dispatcher.merge(Some(&base), Some(&left), Some(&right)).unwrap();
/// assert_eq!(merged.as_deref(), Some(&json!(2)));
/// ```
pub fn merger_fn<V, F>(name: impl Into<String>, merge: F) -> FnMerger<V, F>
where
    V: Clone,
    F: for<'a> Fn(
            Option<&'a V>,
            Option<&'a V>,
            Option<&'a V>,
            &Path,
            &Dispatcher<V>,
        ) -> MergeResult<Outcome<'a, V>>
        + Send
        + Sync,
{
    FnMerger {
        name: name.into(),
        merge,
        _value: PhantomData,
    }
}

impl<V, F> Merger<V> for FnMerger<V, F>
where
    V: Clone,
    F: for<'a> Fn(
            Option<&'a V>,
            Option<&'a V>,
            Option<&'a V>,
            &Path,
            &Dispatcher<V>,
        ) -> MergeResult<Outcome<'a, V>>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn merge<'a>(
        &self,
        base: Option<&'a V>,
        left: Option<&'a V>,
        right: Option<&'a V>,
        path: &Path,
        dispatcher: &Dispatcher<V>,
    ) -> MergeResult<Outcome<'a, V>> {
        (self.merge)(base, left, right, path, dispatcher)
    }
}
