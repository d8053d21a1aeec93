//! Three-way merge engine for trimerge.
//!
//! Merges a base document with two independently edited descendants. Every
//! node is handed to a [`Dispatcher`], an ordered chain of [`Merger`]s. The
//! first merger that understands the node's shape resolves it, recursing into
//! children through the same chain. A node no merger can resolve fails the
//! whole merge with its path.
//!
//! Containers are merged by key: children with the same identity are merged
//! with each other and the key order is reconciled three-way, so moves and
//! edits on different sides combine. Strings are merged as text.
//!
//! # Key Types
//!
//! - [`Dispatcher`] / [`Merger`] / [`Outcome`] -- The composable merge chain
//! - [`mergers`] -- Built-in equality, object, array, map, string and routing mergers
//! - [`MergeConfig`] -- Serializable description of a JSON merge chain
//! - [`MergeError`] -- Path-tagged merge failures
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use trimerge_merge::{merge, MergeConfig};
//!
//! let base = json!({"title": "two", "tags": [1, 2, 3]});
//! let left = json!({"title": "one", "tags": [1, 2, 3]});
//! let right = json!({"title": "two three", "tags": [1, 2, 4, 3]});
//!
//! let merged = merge(&base, &left, &right, &MergeConfig::default()).unwrap();
//! assert_eq!(merged, json!({"title": "one three", "tags": [1, 2, 4, 3]}));
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod json;
pub mod keyed;
pub mod keys;
pub mod merger;
pub mod mergers;
pub mod text;

pub use config::{ArrayIdentity, MergeConfig, MergerKind, RouteConfig};
pub use dispatcher::{Dispatcher, DEFAULT_MAX_DEPTH};
pub use error::{MergeError, MergeResult};
pub use json::{build_dispatcher, merge, merge_with};
pub use keyed::{merge_keyed, KeyedEntries, KeyedMerge};
pub use keys::{diff3_keys, restore_deleted_keys, OrderConflict};
pub use merger::{merger_fn, FnMerger, Merger, Outcome};
pub use text::{
    merge_annotated, merge_strings, slice_annotations, Annotation, MergedText, TextAnnotations,
};
