//! The keyed container driver shared by the object, array and map mergers.
//!
//! Given the `(key, value)` entries of the three versions of a container,
//! [`merge_keyed`] merges every key's values through the dispatcher, works
//! out the merged key order with [`diff3_keys`], and reports whether the
//! result is exactly the left or right container so callers can return it by
//! reference.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::debug;
use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::{MergeError, MergeResult};
use crate::keys::{diff3_keys, restore_deleted_keys};

/// Entries of the three versions of one container, in container order.
pub struct KeyedEntries<'a, K, V> {
    pub base: Vec<(K, &'a V)>,
    pub left: Vec<(K, &'a V)>,
    pub right: Vec<(K, &'a V)>,
}

/// Result of a keyed merge.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyedMerge<K, V> {
    /// Same keys, order and values (by reference) as the left container.
    Left,
    /// Same keys, order and values (by reference) as the right container.
    Right,
    /// A new container with these entries.
    Merged(Vec<(K, V)>),
}

/// Merge the entries of three versions of a container.
///
/// Fails with [`MergeError::DuplicateKey`] if any single version repeats a
/// key, and with [`MergeError::OrderConflict`] on contradictory moves unless
/// `allow_order_conflicts` is set.
pub fn merge_keyed<'a, K, V>(
    entries: KeyedEntries<'a, K, V>,
    path: &Path,
    dispatcher: &Dispatcher<V>,
    allow_order_conflicts: bool,
) -> MergeResult<KeyedMerge<K, V>>
where
    K: Clone + Eq + Hash + fmt::Display + fmt::Debug,
    V: Clone,
{
    let base = index_entries(&entries.base, path)?;
    let left = index_entries(&entries.left, path)?;
    let right = index_entries(&entries.right, path)?;

    // Merge every key first: a merger may keep a value that a side deleted.
    let mut union: Vec<&K> = Vec::new();
    let mut seen: HashSet<&K> = HashSet::new();
    for (key, _) in entries.base.iter().chain(&entries.left).chain(&entries.right) {
        if seen.insert(key) {
            union.push(key);
        }
    }

    let mut merged: HashMap<&K, Cow<'a, V>> = HashMap::with_capacity(union.len());
    let mut restore_left = HashSet::new();
    let mut restore_right = HashSet::new();
    for &key in &union {
        let value = dispatcher.merge_at(
            base.get(key).copied(),
            left.get(key).copied(),
            right.get(key).copied(),
            &path.child(key.to_string()),
        )?;
        let Some(value) = value else {
            continue;
        };
        if !left.contains_key(key) {
            restore_left.insert(key.clone());
        }
        if !right.contains_key(key) {
            restore_right.insert(key.clone());
        }
        merged.insert(key, value);
    }

    let base_keys = keys_of(&entries.base);
    let left_keys = restore_deleted_keys(&base_keys, &keys_of(&entries.left), &restore_left);
    let right_keys = restore_deleted_keys(&base_keys, &keys_of(&entries.right), &restore_right);
    let order = diff3_keys(&base_keys, &left_keys, &right_keys, allow_order_conflicts).map_err(
        |conflict| MergeError::OrderConflict {
            key: conflict.key.to_string(),
            path: path.clone(),
        },
    )?;

    let mut placed: HashSet<&K> = HashSet::with_capacity(order.len());
    let mut result: Vec<(&K, &Cow<'a, V>)> = Vec::with_capacity(merged.len());
    for key in &order {
        if let Some((key, value)) = merged.get_key_value(key) {
            if placed.insert(*key) {
                result.push((*key, value));
            }
        }
    }
    if result.len() < merged.len() {
        let before = result.len();
        for key in &union {
            if let Some(value) = merged.get(*key) {
                if placed.insert(*key) {
                    result.push((*key, value));
                }
            }
        }
        debug!(
            path = %path,
            count = result.len() - before,
            "appending merged keys the reconciled order left out"
        );
    }

    if same_entries(&result, &entries.left) {
        return Ok(KeyedMerge::Left);
    }
    if same_entries(&result, &entries.right) {
        return Ok(KeyedMerge::Right);
    }
    Ok(KeyedMerge::Merged(
        result
            .into_iter()
            .map(|(key, value)| (key.clone(), value.clone().into_owned()))
            .collect(),
    ))
}

fn index_entries<'e, 'a, K, V>(
    entries: &'e [(K, &'a V)],
    path: &Path,
) -> MergeResult<HashMap<&'e K, &'a V>>
where
    K: Eq + Hash + fmt::Display,
{
    let mut index = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        if index.insert(key, *value).is_some() {
            return Err(MergeError::DuplicateKey {
                key: key.to_string(),
                path: path.clone(),
            });
        }
    }
    Ok(index)
}

fn keys_of<K: Clone, V>(entries: &[(K, &V)]) -> Vec<K> {
    entries.iter().map(|(key, _)| key.clone()).collect()
}

/// Same keys in the same order, every value borrowed from `original`.
fn same_entries<K: Eq, V: Clone>(result: &[(&K, &Cow<'_, V>)], original: &[(K, &V)]) -> bool {
    result.len() == original.len()
        && result
            .iter()
            .zip(original)
            .all(|((key, value), (original_key, original_value))| {
                let unchanged = matches!(
                    value,
                    Cow::Borrowed(borrowed) if std::ptr::eq(*borrowed, *original_value)
                );
                *key == original_key && unchanged
            })
}
