use serde::{Deserialize, Serialize};
use trimerge_diff::DiffAlgorithm;

use crate::dispatcher::DEFAULT_MAX_DEPTH;

/// Configuration for JSON merges.
///
/// Describes which mergers to compose and in what order, path-scoped
/// overrides, and limits. Turned into a dispatcher by
/// [`build_dispatcher`](crate::json::build_dispatcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Mergers tried for every node, in order.
    pub mergers: Vec<MergerKind>,
    /// Mergers bound to specific paths. Consulted before the first
    /// non-equality merger.
    pub routes: Vec<RouteConfig>,
    /// Two-way diff used when merging strings.
    pub text_algorithm: DiffAlgorithm,
    /// Maximum nesting depth of a merged document.
    pub max_depth: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mergers: vec![
                MergerKind::Equality,
                MergerKind::Object {
                    allow_order_conflicts: false,
                },
                MergerKind::Array {
                    identity: ArrayIdentity::Value,
                    allow_order_conflicts: false,
                },
                MergerKind::String,
            ],
            routes: Vec::new(),
            text_algorithm: DiffAlgorithm::Myers,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MergeConfig {
    /// Only accept one-sided changes; any concurrent edit is a conflict.
    pub fn equality_only() -> Self {
        Self {
            mergers: vec![MergerKind::Equality],
            ..Default::default()
        }
    }

    /// The default chain with contradictory moves resolved first-wins
    /// instead of failing.
    pub fn tolerant() -> Self {
        let mut config = Self::default();
        for merger in &mut config.mergers {
            match merger {
                MergerKind::Object {
                    allow_order_conflicts,
                }
                | MergerKind::Array {
                    allow_order_conflicts,
                    ..
                } => *allow_order_conflicts = true,
                MergerKind::Equality | MergerKind::String => {}
            }
        }
        config
    }

    /// Bind a merger to a JSON pointer (`*` matches any segment).
    pub fn with_route(mut self, path: impl Into<String>, merger: MergerKind) -> Self {
        self.routes.push(RouteConfig {
            path: path.into(),
            merger,
        });
        self
    }
}

/// A built-in merger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergerKind {
    /// Keep the only changed side, or either side if both agree.
    Equality,
    /// Merge objects field by field.
    Object {
        #[serde(default)]
        allow_order_conflicts: bool,
    },
    /// Merge arrays item by item, aligning items by identity.
    Array {
        #[serde(default)]
        identity: ArrayIdentity,
        #[serde(default)]
        allow_order_conflicts: bool,
    },
    /// Three-way text merge of strings.
    String,
}

/// How array items are matched across versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayIdentity {
    /// By the item itself (strings by their text, other values by their
    /// JSON rendering).
    #[default]
    Value,
    /// By position.
    Index,
    /// By an object field such as `"id"`.
    Field(String),
}

/// A merger bound to a path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// JSON pointer; `*` matches any single segment.
    pub path: String,
    pub merger: MergerKind,
}
