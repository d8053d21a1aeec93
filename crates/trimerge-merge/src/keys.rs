//! Ordered key reconciliation.
//!
//! Containers are merged by identity keys (field names, map keys, array item
//! identities). [`diff3_keys`] decides the order of the merged keys from the
//! three key lists, and [`restore_deleted_keys`] gives a key that a side
//! deleted, but whose value the merge kept, a position in that side's list.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use tracing::debug;
use trimerge_diff::{diff3_merge_indices, diff_indices, MergeIndex, Side};

/// A key that the reconciled order would place twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderConflict<K> {
    pub key: K,
}

/// Reconcile three key orders into one.
///
/// Unchanged runs keep the base order and one-sided runs take that side's
/// order. Where both sides changed the same run, left's keys come first
/// (those it kept that right also kept, plus its own additions), followed by
/// right's additions.
///
/// Contradictory moves can place a key twice. That is an
/// [`OrderConflict`], unless `allow_order_conflicts` is set, in which case
/// the first placement wins.
///
/// # Examples
///
/// ```
/// use trimerge_merge::diff3_keys;
///
/// let order = diff3_keys(&["a", "b", "c"], &["c", "a", "b"], &["b", "a", "c"], false).unwrap();
/// assert_eq!(order, ["c", "b", "a"]);
/// ```
pub fn diff3_keys<K>(
    base: &[K],
    left: &[K],
    right: &[K],
    allow_order_conflicts: bool,
) -> Result<Vec<K>, OrderConflict<K>>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    let mut order = KeyOrder::new(allow_order_conflicts);
    for entry in diff3_merge_indices(base, left, right) {
        match entry {
            MergeIndex::Common { base: range, .. } => order.extend(&base[range])?,
            MergeIndex::SingleSide {
                side: Side::Left,
                range,
            } => order.extend(&left[range])?,
            MergeIndex::SingleSide {
                side: Side::Right,
                range,
            } => order.extend(&right[range])?,
            MergeIndex::Conflict {
                base: base_range,
                left: left_range,
                right: right_range,
            } => {
                let in_base: HashSet<&K> = base[base_range].iter().collect();
                let in_right: HashSet<&K> = right[right_range.clone()].iter().collect();
                let mut from_left = HashSet::new();
                for key in &left[left_range] {
                    if in_right.contains(key) || !in_base.contains(key) {
                        from_left.insert(key);
                        order.push(key)?;
                    }
                }
                // Keys both sides inserted here were already placed by left.
                for key in &right[right_range] {
                    if !in_base.contains(key) && !from_left.contains(key) {
                        order.push(key)?;
                    }
                }
            }
        }
    }
    Ok(order.keys)
}

/// Output order with a seen-set guarding against repeats.
struct KeyOrder<K> {
    keys: Vec<K>,
    seen: HashSet<K>,
    allow_order_conflicts: bool,
}

impl<K: Clone + Eq + Hash + fmt::Debug> KeyOrder<K> {
    fn new(allow_order_conflicts: bool) -> Self {
        Self {
            keys: Vec::new(),
            seen: HashSet::new(),
            allow_order_conflicts,
        }
    }

    fn push(&mut self, key: &K) -> Result<(), OrderConflict<K>> {
        if self.seen.insert(key.clone()) {
            self.keys.push(key.clone());
            return Ok(());
        }
        if self.allow_order_conflicts {
            debug!(key = ?key, "order conflict tolerated, keeping first position");
            return Ok(());
        }
        Err(OrderConflict { key: key.clone() })
    }

    fn extend(&mut self, keys: &[K]) -> Result<(), OrderConflict<K>> {
        keys.iter().try_for_each(|key| self.push(key))
    }
}

/// Re-insert deleted keys into a side's key list.
///
/// Every key in `restore` that `side` lacks is put back where it sat in
/// `base`, relative to the keys around it. Within one changed region the
/// restored keys go ahead of the side's own insertions. When `side` already
/// contains every key in `restore` it is returned unchanged.
pub fn restore_deleted_keys<K>(base: &[K], side: &[K], restore: &HashSet<K>) -> Vec<K>
where
    K: Clone + Eq + Hash,
{
    let present: HashSet<&K> = side.iter().collect();
    if restore.iter().all(|key| present.contains(key)) {
        return side.to_vec();
    }

    let mut restored = Vec::with_capacity(side.len() + restore.len());
    let mut side_pos = 0;
    for segment in diff_indices(base, side) {
        restored.extend_from_slice(&side[side_pos..segment.side.start]);
        restored.extend(
            base[segment.base]
                .iter()
                .filter(|key| restore.contains(*key) && !present.contains(*key))
                .cloned(),
        );
        restored.extend_from_slice(&side[segment.side.clone()]);
        side_pos = segment.side.end;
    }
    restored.extend_from_slice(&side[side_pos..]);
    restored
}
