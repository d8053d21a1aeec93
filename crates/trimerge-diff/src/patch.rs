//! Two-way JSON diff and patch replay.
//!
//! [`diff_values`] describes how to turn one JSON document into another as an
//! ordered list of [`PatchOperation`]s, and [`apply_patch`] replays such a
//! list. This is independent of the three-way merge: it is the compact form
//! used to ship a single edit between replicas.
//!
//! Objects are diffed key by key, arrays and strings as sequences. Splice
//! indices are positions in the partially patched value, so operations must
//! be applied in order. String offsets count `char`s.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use trimerge_types::Path;

use crate::error::{DiffError, DiffResult};
use crate::sequence::{diff_indices, diff_sequences, DiffAlgorithm};

/// A single edit against a JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOperation {
    /// Replace the node at `path`, or remove it when `value` is `None`.
    Set {
        path: Path,
        #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
        value: Option<Value>,
    },
    /// Remove `remove` elements at `index` of the array or string at `path`
    /// and insert new content in their place.
    Splice {
        path: Path,
        index: usize,
        remove: usize,
        insert: SpliceInsert,
    },
}

// A `null` value is a set to null; only a missing value is a removal.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl PatchOperation {
    /// The path the operation targets.
    pub fn path(&self) -> &Path {
        match self {
            PatchOperation::Set { path, .. } | PatchOperation::Splice { path, .. } => path,
        }
    }
}

/// Content inserted by a splice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpliceInsert {
    Items(Vec<Value>),
    Text(String),
}

impl SpliceInsert {
    /// Number of inserted elements (items or chars).
    pub fn len(&self) -> usize {
        match self {
            SpliceInsert::Items(items) => items.len(),
            SpliceInsert::Text(text) => text.chars().count(),
        }
    }

    /// Returns `true` if nothing is inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Compute the operations that turn `before` into `after`.
///
/// Equal documents produce an empty list.
pub fn diff_values(before: &Value, after: &Value) -> Vec<PatchOperation> {
    let mut ops = Vec::new();
    diff_node(Some(before), Some(after), &Path::root(), &mut ops);
    ops
}

fn diff_node(
    before: Option<&Value>,
    after: Option<&Value>,
    path: &Path,
    ops: &mut Vec<PatchOperation>,
) {
    if before == after {
        return;
    }
    match (before, after) {
        (Some(Value::Object(before)), Some(Value::Object(after))) => {
            diff_objects(before, after, path, ops)
        }
        (Some(Value::Array(before)), Some(Value::Array(after))) => {
            diff_arrays(before, after, path, ops)
        }
        (Some(Value::String(before)), Some(Value::String(after))) => {
            diff_strings(before, after, path, ops)
        }
        _ => ops.push(PatchOperation::Set {
            path: path.clone(),
            value: after.cloned(),
        }),
    }
}

fn diff_objects(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    path: &Path,
    ops: &mut Vec<PatchOperation>,
) {
    let added = after.keys().filter(|key| !before.contains_key(*key));
    for key in before.keys().chain(added) {
        diff_node(before.get(key), after.get(key), &path.child(key.as_str()), ops);
    }
}

fn diff_arrays(before: &[Value], after: &[Value], path: &Path, ops: &mut Vec<PatchOperation>) {
    let render = |items: &[Value]| items.iter().map(Value::to_string).collect::<Vec<_>>();
    for segment in diff_indices(&render(before), &render(after)) {
        // Earlier splices already made the prefix equal to `after`.
        ops.push(PatchOperation::Splice {
            path: path.clone(),
            index: segment.side.start,
            remove: segment.base.len(),
            insert: SpliceInsert::Items(after[segment.side].to_vec()),
        });
    }
}

fn diff_strings(before: &str, after: &str, path: &Path, ops: &mut Vec<PatchOperation>) {
    let before: Vec<char> = before.chars().collect();
    let after: Vec<char> = after.chars().collect();
    for segment in diff_sequences(&before, &after, DiffAlgorithm::Myers) {
        ops.push(PatchOperation::Splice {
            path: path.clone(),
            index: segment.side.start,
            remove: segment.base.len(),
            insert: SpliceInsert::Text(after[segment.side].iter().collect()),
        });
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Replay `ops` against `value` in order.
///
/// A `Set` at the root with no value yields `null`.
pub fn apply_patch(mut value: Value, ops: &[PatchOperation]) -> DiffResult<Value> {
    for op in ops {
        match op {
            PatchOperation::Set { path, value: new } => {
                apply_set(&mut value, path, new.clone())?
            }
            PatchOperation::Splice {
                path,
                index,
                remove,
                insert,
            } => apply_splice(&mut value, path, *index, *remove, insert)?,
        }
    }
    Ok(value)
}

fn apply_set(root: &mut Value, path: &Path, value: Option<Value>) -> DiffResult<()> {
    let Some((last, parents)) = path.segments().split_last() else {
        *root = value.unwrap_or(Value::Null);
        return Ok(());
    };
    match lookup_mut(root, parents, path)? {
        Value::Object(map) => {
            match value {
                Some(value) => {
                    map.insert(last.clone(), value);
                }
                None => {
                    map.shift_remove(last);
                }
            }
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            match value {
                Some(value) if index < items.len() => items[index] = value,
                Some(value) if index == items.len() => items.push(value),
                None if index < items.len() => {
                    items.remove(index);
                }
                _ => return Err(DiffError::PathNotFound(path.clone())),
            }
            Ok(())
        }
        _ => Err(DiffError::UnexpectedKind {
            path: path.clone(),
            expected: "object or array".into(),
        }),
    }
}

fn apply_splice(
    root: &mut Value,
    path: &Path,
    index: usize,
    remove: usize,
    insert: &SpliceInsert,
) -> DiffResult<()> {
    let target = lookup_mut(root, path.segments(), path)?;
    // Index and count come from the wire, so their sum may overflow.
    let splice_end = |len: usize| {
        index
            .checked_add(remove)
            .filter(|end| *end <= len)
            .ok_or_else(|| DiffError::OutOfRange {
                path: path.clone(),
                index,
                remove,
                len,
            })
    };
    match (target, insert) {
        (Value::Array(items), SpliceInsert::Items(new_items)) => {
            let end = splice_end(items.len())?;
            items.splice(index..end, new_items.iter().cloned());
            Ok(())
        }
        (Value::String(text), SpliceInsert::Text(new_text)) => {
            let chars: Vec<char> = text.chars().collect();
            let end = splice_end(chars.len())?;
            let mut spliced: String = chars[..index].iter().collect();
            spliced.push_str(new_text);
            spliced.extend(&chars[end..]);
            *text = spliced;
            Ok(())
        }
        (_, insert) => Err(DiffError::UnexpectedKind {
            path: path.clone(),
            expected: match insert {
                SpliceInsert::Items(_) => "array".into(),
                SpliceInsert::Text(_) => "string".into(),
            },
        }),
    }
}

fn lookup_mut<'v>(
    root: &'v mut Value,
    segments: &[String],
    path: &Path,
) -> DiffResult<&'v mut Value> {
    let mut node = root;
    for segment in segments {
        let child = match node {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index)),
            _ => None,
        };
        node = child.ok_or_else(|| DiffError::PathNotFound(path.clone()))?;
    }
    Ok(node)
}

fn parse_index(segment: &str, path: &Path) -> DiffResult<usize> {
    segment
        .parse()
        .map_err(|_| DiffError::PathNotFound(path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(pointer: &str) -> Path {
        Path::parse(pointer).unwrap()
    }

    #[test]
    fn operations_serialize_tagged() {
        let ops = vec![
            PatchOperation::Set {
                path: path("/a"),
                value: Some(Value::Null),
            },
            PatchOperation::Set {
                path: path("/b"),
                value: None,
            },
            PatchOperation::Splice {
                path: path("/s"),
                index: 1,
                remove: 0,
                insert: SpliceInsert::Text("xy".into()),
            },
        ];
        let json = serde_json::to_value(&ops).unwrap();
        assert_eq!(json[0]["op"], "set");
        assert!(json[0].get("value").is_some());
        assert!(json[1].get("value").is_none());
        assert_eq!(json[2]["insert"], "xy");
        let parsed: Vec<PatchOperation> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ops);
    }

    #[test]
    fn equal_documents_have_no_ops() {
        let doc = json!({"a": [1, 2], "b": "text"});
        assert!(diff_values(&doc, &doc.clone()).is_empty());
    }

    #[test]
    fn object_changes_become_sets() {
        let before = json!({"hello": 1, "world": 2});
        let after = json!({"hello": 1, "there": true});
        let ops = diff_values(&before, &after);
        assert_eq!(
            ops,
            vec![
                PatchOperation::Set {
                    path: path("/world"),
                    value: None
                },
                PatchOperation::Set {
                    path: path("/there"),
                    value: Some(json!(true))
                },
            ]
        );
        assert_eq!(apply_patch(before, &ops).unwrap(), after);
    }

    #[test]
    fn array_changes_become_splices() {
        let before = json!([1, 2, 3]);
        let after = json!([1, 4, 3, 5]);
        let ops = diff_values(&before, &after);
        assert_eq!(
            ops,
            vec![
                PatchOperation::Splice {
                    path: Path::root(),
                    index: 1,
                    remove: 1,
                    insert: SpliceInsert::Items(vec![json!(4)]),
                },
                PatchOperation::Splice {
                    path: Path::root(),
                    index: 3,
                    remove: 0,
                    insert: SpliceInsert::Items(vec![json!(5)]),
                },
            ]
        );
        assert_eq!(apply_patch(before, &ops).unwrap(), after);
    }

    #[test]
    fn string_changes_become_text_splices() {
        let before = json!({"title": "hello world"});
        let after = json!({"title": "hello there world!"});
        let ops = diff_values(&before, &after);
        assert!(ops
            .iter()
            .all(|op| matches!(op, PatchOperation::Splice { insert: SpliceInsert::Text(_), .. })));
        assert_eq!(apply_patch(before, &ops).unwrap(), after);
    }

    #[test]
    fn kind_change_is_a_set() {
        let ops = diff_values(&json!({"a": [1]}), &json!({"a": "one"}));
        assert_eq!(
            ops,
            vec![PatchOperation::Set {
                path: path("/a"),
                value: Some(json!("one"))
            }]
        );
    }

    #[test]
    fn nested_roundtrip() {
        let before = json!({
            "shapes": [{"id": "a", "x": 1}, {"id": "b", "x": 2}],
            "name": "canvas",
            "meta": {"tags": ["x", "y"]}
        });
        let after = json!({
            "shapes": [{"id": "b", "x": 2}, {"id": "c", "x": 3}],
            "name": "my canvas",
            "meta": {"tags": ["y"], "locked": true}
        });
        let ops = diff_values(&before, &after);
        assert_eq!(apply_patch(before, &ops).unwrap(), after);
    }

    #[test]
    fn unicode_offsets_count_chars() {
        let before = json!("héllo");
        let after = json!("héllo wörld");
        let ops = diff_values(&before, &after);
        assert_eq!(
            ops,
            vec![PatchOperation::Splice {
                path: Path::root(),
                index: 5,
                remove: 0,
                insert: SpliceInsert::Text(" wörld".into()),
            }]
        );
        assert_eq!(apply_patch(before, &ops).unwrap(), after);
    }

    #[test]
    fn set_root_without_value_is_null() {
        let ops = [PatchOperation::Set {
            path: Path::root(),
            value: None,
        }];
        assert_eq!(apply_patch(json!({"a": 1}), &ops).unwrap(), Value::Null);
    }

    #[test]
    fn set_into_array_by_index() {
        let ops = [
            PatchOperation::Set {
                path: path("/list/0"),
                value: Some(json!("zero")),
            },
            PatchOperation::Set {
                path: path("/list/2"),
                value: Some(json!("two")),
            },
        ];
        let patched = apply_patch(json!({"list": [0, 1]}), &ops).unwrap();
        assert_eq!(patched, json!({"list": ["zero", 1, "two"]}));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let ops = [PatchOperation::Set {
            path: path("/missing/child"),
            value: Some(json!(1)),
        }];
        assert_eq!(
            apply_patch(json!({}), &ops),
            Err(DiffError::PathNotFound(path("/missing/child")))
        );
    }

    #[test]
    fn splice_out_of_range_is_an_error() {
        let ops = [PatchOperation::Splice {
            path: Path::root(),
            index: 2,
            remove: 2,
            insert: SpliceInsert::Items(vec![]),
        }];
        assert_eq!(
            apply_patch(json!([1, 2, 3]), &ops),
            Err(DiffError::OutOfRange {
                path: Path::root(),
                index: 2,
                remove: 2,
                len: 3
            })
        );
    }

    #[test]
    fn overflowing_splice_from_the_wire_is_an_error() {
        let ops: Vec<PatchOperation> = serde_json::from_value(json!([
            {"op": "splice", "path": [], "index": u64::MAX, "remove": 1, "insert": []}
        ]))
        .unwrap();
        assert_eq!(
            apply_patch(json!([1, 2, 3]), &ops),
            Err(DiffError::OutOfRange {
                path: Path::root(),
                index: usize::MAX,
                remove: 1,
                len: 3
            })
        );

        let ops = [PatchOperation::Splice {
            path: Path::root(),
            index: 1,
            remove: usize::MAX,
            insert: SpliceInsert::Text("x".into()),
        }];
        assert!(matches!(
            apply_patch(json!("abc"), &ops),
            Err(DiffError::OutOfRange { len: 3, .. })
        ));
    }

    #[test]
    fn splice_on_wrong_kind_is_an_error() {
        let ops = [PatchOperation::Splice {
            path: Path::root(),
            index: 0,
            remove: 0,
            insert: SpliceInsert::Text("x".into()),
        }];
        assert!(matches!(
            apply_patch(json!([1]), &ops),
            Err(DiffError::UnexpectedKind { .. })
        ));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn small_doc() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                (0i64..5).prop_map(Value::from),
                "[ab]{0,4}".prop_map(Value::from),
            ];
            leaf.prop_recursive(3, 16, 4, |inner| {
                prop_oneof![
                    proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    proptest::collection::btree_map("[abc]", inner, 0..3)
                        .prop_map(|map| Value::Object(map.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn patch_of_diff_reproduces_target(before in small_doc(), after in small_doc()) {
                let ops = diff_values(&before, &after);
                prop_assert_eq!(apply_patch(before, &ops).unwrap(), after);
            }
        }
    }
}
