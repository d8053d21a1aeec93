use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use trimerge_types::Path;

use super::keyed::{KeyedMerger, KeyedShape};

/// A host value type that may hold keyed maps.
///
/// Implement this to merge maps in your own document model with
/// [`MapMerger`].
pub trait MapNode: Clone + Send + Sync {
    type Key: Clone + Eq + Hash + fmt::Display + fmt::Debug;

    /// The map's entries in iteration order, or `None` if this node is not a
    /// map.
    fn map_entries(&self) -> Option<Vec<(Self::Key, &Self)>>;

    /// Build a map node from entries.
    fn from_map_entries(entries: Vec<(Self::Key, Self)>) -> Self;
}

/// Maps of any [`MapNode`] type. All three versions must be maps.
pub struct MapShape<V> {
    _node: PhantomData<fn() -> V>,
}

/// Entry-by-entry merge of [`MapNode`] maps.
pub type MapMerger<V> = KeyedMerger<MapShape<V>>;

impl<V> MapShape<V> {
    pub fn new() -> Self {
        Self { _node: PhantomData }
    }
}

impl<V> Default for MapShape<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for MapShape<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapShape")
    }
}

impl<V: MapNode> KeyedShape<V> for MapShape<V> {
    type Key = V::Key;

    fn name(&self) -> &str {
        "map"
    }

    fn entries<'a>(&self, value: &'a V, _path: &Path) -> Option<Vec<(V::Key, &'a V)>> {
        value.map_entries()
    }

    fn build(&self, entries: Vec<(V::Key, V)>) -> V {
        V::from_map_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::error::MergeError;
    use crate::mergers::EqualityMerger;
    use std::borrow::Cow;

    #[derive(Clone, Debug, PartialEq)]
    enum Node {
        Leaf(i32),
        Map(Vec<(u32, Node)>),
    }

    impl MapNode for Node {
        type Key = u32;

        fn map_entries(&self) -> Option<Vec<(u32, &Node)>> {
            match self {
                Node::Map(entries) => {
                    Some(entries.iter().map(|(key, node)| (*key, node)).collect())
                }
                Node::Leaf(_) => None,
            }
        }

        fn from_map_entries(entries: Vec<(u32, Node)>) -> Node {
            Node::Map(entries)
        }
    }

    fn map(entries: &[(u32, i32)]) -> Node {
        Node::Map(entries.iter().map(|(key, value)| (*key, Node::Leaf(*value))).collect())
    }

    fn dispatcher() -> Dispatcher<Node> {
        Dispatcher::new()
            .with_merger(EqualityMerger::deep())
            .with_merger(MapMerger::<Node>::default())
    }

    #[test]
    fn entries_merge_independently() {
        let base = map(&[(1, 1), (2, 2), (3, 3)]);
        let left = map(&[(1, 10), (2, 2)]);
        let right = map(&[(1, 1), (2, 20), (3, 3), (4, 4)]);
        let merged = dispatcher().merge(Some(&base), Some(&left), Some(&right)).unwrap();
        assert_eq!(merged.as_deref(), Some(&map(&[(1, 10), (2, 20), (4, 4)])));
    }

    #[test]
    fn nested_maps() {
        let base = Node::Map(vec![(1, map(&[(1, 1)]))]);
        let left = Node::Map(vec![(1, map(&[(1, 1), (2, 2)]))]);
        let right = Node::Map(vec![(1, map(&[(1, 5)]))]);
        let merged = dispatcher().merge(Some(&base), Some(&left), Some(&right)).unwrap();
        assert_eq!(merged.as_deref(), Some(&Node::Map(vec![(1, map(&[(1, 5), (2, 2)]))])));
    }

    #[test]
    fn conflict_path_uses_keys() {
        let base = Node::Map(vec![(7, map(&[(3, 1)]))]);
        let left = Node::Map(vec![(7, map(&[(3, 2)]))]);
        let right = Node::Map(vec![(7, map(&[(3, 4)]))]);
        let err = dispatcher().merge(Some(&base), Some(&left), Some(&right)).unwrap_err();
        assert_eq!(err, MergeError::conflict(&Path::from_segments(["7", "3"])));
    }

    #[test]
    fn leaves_are_not_maps() {
        let merger = MapMerger::<Node>::default();
        let (base, left, right) = (map(&[]), Node::Leaf(1), map(&[(1, 1)]));
        let dispatcher = dispatcher();
        let outcome = crate::merger::Merger::merge(
            &merger,
            Some(&base),
            Some(&left),
            Some(&right),
            &Path::root(),
            &dispatcher,
        )
        .unwrap();
        assert!(!outcome.is_applicable());
    }

    #[test]
    fn unchanged_side_is_kept_by_reference() {
        let base = map(&[(1, 1)]);
        let left = map(&[(1, 2)]);
        let right = map(&[(1, 1)]);
        let merged = dispatcher().merge(Some(&base), Some(&left), Some(&right)).unwrap();
        assert!(matches!(merged, Some(Cow::Borrowed(node)) if std::ptr::eq(node, &left)));
    }
}
