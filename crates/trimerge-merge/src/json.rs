//! Merging `serde_json` documents from a [`MergeConfig`].

use std::borrow::Cow;

use serde_json::Value;
use tracing::debug;

use crate::config::{MergeConfig, MergerKind};
use crate::dispatcher::Dispatcher;
use crate::error::MergeResult;
use crate::merger::Merger;
use crate::mergers::{
    ArrayMerger, EqualityMerger, ObjectMerger, RouteMerger, RouteSegment, StringMerger,
};

/// Build the dispatcher described by `config`.
///
/// Routes are consulted right before the first merger that is not
/// [`MergerKind::Equality`], so unchanged nodes never reach a routed merger.
pub fn build_dispatcher(config: &MergeConfig) -> MergeResult<Dispatcher<Value>> {
    let mut router = if config.routes.is_empty() {
        None
    } else {
        let mut router = RouteMerger::new();
        for route in &config.routes {
            let segments = RouteSegment::parse_route(&route.path)?;
            router.add_route(segments, build_merger(&route.merger, config))?;
        }
        Some(router)
    };

    let mut mergers: Vec<Box<dyn Merger<Value>>> = Vec::with_capacity(config.mergers.len() + 1);
    for kind in &config.mergers {
        if *kind != MergerKind::Equality {
            if let Some(router) = router.take() {
                mergers.push(Box::new(router));
            }
        }
        mergers.push(build_merger(kind, config));
    }
    if let Some(router) = router {
        mergers.push(Box::new(router));
    }

    let dispatcher = Dispatcher::combine(mergers).with_max_depth(config.max_depth);
    debug!(
        mergers = ?dispatcher.merger_names(),
        routes = config.routes.len(),
        max_depth = config.max_depth,
        "dispatcher built"
    );
    Ok(dispatcher)
}

fn build_merger(kind: &MergerKind, config: &MergeConfig) -> Box<dyn Merger<Value>> {
    match kind {
        MergerKind::Equality => Box::new(EqualityMerger::deep()),
        MergerKind::Object {
            allow_order_conflicts,
        } => Box::new(ObjectMerger::default().allow_order_conflicts(*allow_order_conflicts)),
        MergerKind::Array {
            identity,
            allow_order_conflicts,
        } => Box::new(
            ArrayMerger::by(identity.clone()).allow_order_conflicts(*allow_order_conflicts),
        ),
        MergerKind::String => Box::new(StringMerger::new(config.text_algorithm)),
    }
}

/// Merge three versions of a JSON document.
///
/// # Errors
///
/// Fails with the path of the first node no merger could resolve, or on a
/// duplicate key, contradictory move, or depth overflow.
pub fn merge(
    base: &Value,
    left: &Value,
    right: &Value,
    config: &MergeConfig,
) -> MergeResult<Value> {
    let dispatcher = build_dispatcher(config)?;
    Ok(merge_with(&dispatcher, base, left, right)?.into_owned())
}

/// Merge with a prebuilt dispatcher, returning an input by reference when
/// the merge resolves to it. A deleted root becomes `null`.
pub fn merge_with<'a>(
    dispatcher: &Dispatcher<Value>,
    base: &'a Value,
    left: &'a Value,
    right: &'a Value,
) -> MergeResult<Cow<'a, Value>> {
    Ok(dispatcher
        .merge(Some(base), Some(left), Some(right))?
        .unwrap_or(Cow::Owned(Value::Null)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArrayIdentity;
    use crate::error::MergeError;
    use crate::merger::{merger_fn, Outcome};
    use serde_json::json;
    use trimerge_types::Path;

    fn merge_default(base: Value, left: Value, right: Value) -> MergeResult<Value> {
        merge(&base, &left, &right, &MergeConfig::default())
    }

    #[test]
    fn default_chain_order() {
        let dispatcher = build_dispatcher(&MergeConfig::default()).unwrap();
        assert_eq!(dispatcher.merger_names(), ["equality", "object", "array", "string"]);
        assert_eq!(dispatcher.max_depth(), MergeConfig::default().max_depth);
    }

    #[test]
    fn router_goes_before_first_structural_merger() {
        let config = MergeConfig::default().with_route("/title", MergerKind::String);
        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(
            dispatcher.merger_names(),
            ["equality", "router", "object", "array", "string"]
        );

        let config = MergeConfig::equality_only().with_route("/title", MergerKind::String);
        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.merger_names(), ["equality", "router"]);
    }

    #[test]
    fn bad_routes_are_rejected() {
        let config = MergeConfig::default().with_route("title", MergerKind::String);
        assert!(matches!(build_dispatcher(&config), Err(MergeError::InvalidRoute(_))));

        let config = MergeConfig::default()
            .with_route("/title", MergerKind::String)
            .with_route("/title", MergerKind::Equality);
        assert!(matches!(build_dispatcher(&config), Err(MergeError::DuplicateRoute { .. })));
    }

    #[test]
    fn array_insertion() {
        assert_eq!(
            merge_default(json!([1, 2, 3]), json!([1, 2, 3]), json!([1, 2, 4, 3])).unwrap(),
            json!([1, 2, 4, 3])
        );
    }

    #[test]
    fn contradictory_array_moves() {
        let (base, left, right) = (json!([1, 2, 3, 4]), json!([3, 1, 2, 4]), json!([1, 2, 4, 3]));
        let err = merge(&base, &left, &right, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::OrderConflict { .. }), "{err}");
        assert_eq!(
            merge(&base, &left, &right, &MergeConfig::tolerant()).unwrap(),
            json!([3, 1, 2, 4])
        );
    }

    #[test]
    fn delete_versus_edit_conflicts() {
        let err = merge_default(
            json!({"hello": 1, "world": 2}),
            json!({"hello": 1}),
            json!({"hello": 1, "world": 3}),
        )
        .unwrap_err();
        assert_eq!(err, MergeError::conflict(&Path::from_segments(["world"])));
        assert_eq!(err.to_string(), r#"cannot merge "/world""#);
    }

    #[test]
    fn string_fields_merge_as_text() {
        assert_eq!(
            merge_default(json!({"t": "two"}), json!({"t": "one"}), json!({"t": "two three"}))
                .unwrap(),
            json!({"t": "one three"})
        );
    }

    #[test]
    fn identical_inputs_come_back_by_reference() {
        let dispatcher = build_dispatcher(&MergeConfig::default()).unwrap();
        for value in [json!(null), json!(1), json!("x"), json!([1, {"a": 2}]), json!({"a": [1]})] {
            let merged = merge_with(&dispatcher, &value, &value, &value).unwrap();
            assert!(matches!(merged, Cow::Borrowed(v) if std::ptr::eq(v, &value)));
        }
    }

    #[test]
    fn array_moves_and_edits() {
        let cases = [
            (json!([1, 2, 3]), json!([2, 1, 3]), json!([1, 2, 3, 4]), json!([2, 1, 3, 4])),
            (
                json!([1, 2, 3, 4, 5, 6]),
                json!([1, 2, 3, 4, 6, 5]),
                json!([2, 1, 3, 4, 5, 6]),
                json!([2, 1, 3, 4, 6, 5]),
            ),
            (json!([1, 2, 3]), json!([2, 3]), json!([1, 2]), json!([2])),
            (json!([1, 2, 3]), json!([2, 3]), json!([1, 2, 4, 3]), json!([2, 4, 3])),
        ];
        for (base, left, right, expected) in cases {
            assert_eq!(merge(&base, &left, &right, &MergeConfig::default()).unwrap(), expected);
        }
    }

    #[test]
    fn keyed_object_arrays() {
        let config = MergeConfig {
            mergers: vec![
                MergerKind::Equality,
                MergerKind::Array {
                    identity: ArrayIdentity::Field("id".into()),
                    allow_order_conflicts: false,
                },
            ],
            ..Default::default()
        };
        let base = json!([{"id": 1, "value": 1}, {"id": 2, "value": 2}, {"id": 3, "value": 3}]);
        let left = json!([{"id": 2, "value": 10}, {"id": 3, "value": 3}]);
        let right = json!([
            {"id": 1, "value": 1},
            {"id": 2, "value": 2},
            {"id": 3, "value": 3},
            {"id": 4, "value": 4}
        ]);
        assert_eq!(
            merge(&base, &left, &right, &config).unwrap(),
            json!([{"id": 2, "value": 10}, {"id": 3, "value": 3}, {"id": 4, "value": 4}])
        );

        let base = json!([{"id": "foo"}, {"id": "bar"}]);
        let left = json!([{"id": "foo"}, {"id": "bar", "value": 1}]);
        let right = json!([{"id": "foo"}, {"id": "bar", "value": 2}]);
        let err = merge(&base, &left, &right, &config).unwrap_err();
        assert_eq!(err.to_string(), r#"cannot merge "/bar""#);
    }

    #[test]
    fn duplicate_array_items_fail() {
        let err = merge_default(
            json!([1, 2, 4, 5, 6, 2]),
            json!([1, 5, 2, 4, 6]),
            json!([2, 3, 4, 1, 5, 6]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MergeError::DuplicateKey {
                key: "2".into(),
                path: Path::root()
            }
        );
    }

    fn canvas_config() -> MergeConfig {
        MergeConfig {
            mergers: vec![
                MergerKind::Equality,
                MergerKind::Object {
                    allow_order_conflicts: false,
                },
            ],
            ..Default::default()
        }
        .with_route("/title", MergerKind::String)
        .with_route(
            "/canvas/shapes",
            MergerKind::Array {
                identity: ArrayIdentity::Field("key".into()),
                allow_order_conflicts: false,
            },
        )
    }

    #[test]
    fn canvas_titles() {
        let config = canvas_config();
        let cases = [
            (json!({}), json!({}), json!({"title": "new title"}), json!({"title": "new title"})),
            (
                json!({}),
                json!({"title": "title"}),
                json!({"title": "new title"}),
                json!({"title": "titlenew title"}),
            ),
            (
                json!({"title": "original title"}),
                json!({"title": "original title is great"}),
                json!({"title": "new title"}),
                json!({"title": "new title is great"}),
            ),
        ];
        for (base, left, right, expected) in cases {
            assert_eq!(merge(&base, &left, &right, &config).unwrap(), expected);
        }
    }

    #[test]
    fn canvas_shapes() {
        let shape = |key: &str, x: i64| {
            json!({"key": key, "type": "rect", "x": x, "y": 10, "w": 200, "h": 200})
        };
        let base = json!({
            "title": "original title",
            "canvas": {"width": 100, "height": 100, "shapes": [shape("1", 10)]}
        });
        let mut left = base.clone();
        left["canvas"]["shapes"] = json!([shape("1", 10), shape("2", 10)]);
        left["title"] = json!("original title is great");
        let mut right = base.clone();
        right["canvas"]["shapes"] = json!([shape("1", 50), shape("3", 10)]);
        right["canvas"]["width"] = json!(300);

        let merged = merge(&base, &left, &right, &canvas_config()).unwrap();
        assert_eq!(
            merged,
            json!({
                "title": "original title is great",
                "canvas": {
                    "width": 300,
                    "height": 100,
                    "shapes": [shape("1", 50), shape("2", 10), shape("3", 10)]
                }
            })
        );
    }

    #[test]
    fn canvas_shape_conflict_names_the_shape() {
        let base = json!({"canvas": {"shapes": [{"key": "a", "x": 1}]}});
        let left = json!({"canvas": {"shapes": [{"key": "a", "x": 2}]}});
        let right = json!({"canvas": {"shapes": [{"key": "a", "x": 3}]}});
        let err = merge(&base, &left, &right, &canvas_config()).unwrap_err();
        assert_eq!(err.path(), Some(&Path::from_segments(["canvas", "shapes", "a", "x"])));
    }

    #[test]
    fn depth_limit_applies() {
        let config = MergeConfig {
            max_depth: 1,
            ..Default::default()
        };
        let base = json!({"a": {"b": 1}});
        let (left, right) = (json!({"a": {"b": 2}}), json!({"a": {"b": 3}}));
        let err = merge(&base, &left, &right, &config).unwrap_err();
        assert!(matches!(err, MergeError::DepthExceeded { limit: 1, .. }), "{err}");
    }

    #[test]
    fn custom_merger_can_delete_root() {
        let dispatcher = Dispatcher::new().with_merger(merger_fn::<Value, _>(
            "drop",
            |_base, _left, _right, _path, _dispatcher| Ok(Outcome::deleted()),
        ));
        let (base, left, right) = (json!(1), json!(2), json!(3));
        let merged = merge_with(&dispatcher, &base, &left, &right).unwrap();
        assert_eq!(merged.into_owned(), Value::Null);
    }

    #[test]
    fn fallback_merger_collects_conflicts() {
        use std::sync::{Arc, Mutex};

        let conflicts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&conflicts);
        let mut dispatcher = build_dispatcher(&MergeConfig::default()).unwrap();
        dispatcher.add_merger(Box::new(merger_fn::<Value, _>(
            "collect",
            move |_base, left, _right, path, _dispatcher| {
                seen.lock().unwrap().push(path.to_string());
                Ok(Outcome::input(left))
            },
        )));

        let base = json!({"a": 1, "b": 1, "c": 1});
        let left = json!({"a": 2, "b": 2, "c": 1});
        let right = json!({"a": 3, "b": 3, "c": 4});
        let merged = merge_with(&dispatcher, &base, &left, &right).unwrap();
        assert_eq!(merged.into_owned(), json!({"a": 2, "b": 2, "c": 4}));
        assert_eq!(*conflicts.lock().unwrap(), ["/a", "/b"]);
    }

    #[test]
    fn dispatcher_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher<Value>>();
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn doc() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                (0i64..5).prop_map(Value::from),
                "[ab ]{0,4}".prop_map(Value::from),
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
            fn one_sided_change_wins(base in doc(), changed in doc()) {
                let config = MergeConfig::default();
                prop_assert_eq!(merge(&base, &changed, &base, &config).unwrap(), changed.clone());
                prop_assert_eq!(merge(&base, &base, &changed, &config).unwrap(), changed);
            }

            #[test]
            fn same_input_merges_to_itself(value in doc()) {
                let copy = value.clone();
                let merged = merge(&value, &copy, &value, &MergeConfig::default()).unwrap();
                prop_assert_eq!(merged, value);
            }
        }
    }
}
