use std::fmt;

use serde_json::Value;
use trimerge_types::Path;

use super::keyed::{KeyedMerger, KeyedShape};
use crate::config::ArrayIdentity;

/// Derives an array item's identity from the item, its index and the path of
/// the array.
pub type ArrayKeyFn = Box<dyn Fn(&Value, usize, &Path) -> String + Send + Sync>;

enum Identity {
    Builtin(ArrayIdentity),
    Custom(ArrayKeyFn),
}

/// JSON arrays, keyed by item identity.
///
/// Items with the same identity in different versions are merged with each
/// other, so an item can be edited on one side and moved on the other. The
/// base must itself be an array.
pub struct ArrayShape {
    identity: Identity,
}

/// Item-by-item merge of JSON arrays.
pub type ArrayMerger = KeyedMerger<ArrayShape>;

impl ArrayShape {
    pub fn new(identity: ArrayIdentity) -> Self {
        Self {
            identity: Identity::Builtin(identity),
        }
    }

    /// Key items with a custom function.
    pub fn with_key_fn(
        key_fn: impl Fn(&Value, usize, &Path) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            identity: Identity::Custom(Box::new(key_fn)),
        }
    }

    /// The identity of `item` at `index` in the array at `path`.
    pub fn key(&self, item: &Value, index: usize, path: &Path) -> String {
        match &self.identity {
            Identity::Builtin(ArrayIdentity::Value) => render(item),
            Identity::Builtin(ArrayIdentity::Index) => index.to_string(),
            Identity::Builtin(ArrayIdentity::Field(field)) => {
                item.get(field).map_or_else(|| render(item), render)
            }
            Identity::Custom(key_fn) => key_fn(item, index, path),
        }
    }
}

/// Strings are keyed by their text, everything else by its JSON rendering.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Default for ArrayShape {
    fn default() -> Self {
        Self::new(ArrayIdentity::Value)
    }
}

impl fmt::Debug for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            Identity::Builtin(identity) => f.debug_tuple("ArrayShape").field(identity).finish(),
            Identity::Custom(_) => f.write_str("ArrayShape(<key fn>)"),
        }
    }
}

impl KeyedShape<Value> for ArrayShape {
    type Key = String;

    fn name(&self) -> &str {
        "array"
    }

    fn entries<'a>(&self, value: &'a Value, path: &Path) -> Option<Vec<(String, &'a Value)>> {
        let items = value.as_array()?;
        Some(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| (self.key(item, index, path), item))
                .collect(),
        )
    }

    fn build(&self, entries: Vec<(String, Value)>) -> Value {
        Value::Array(entries.into_iter().map(|(_, item)| item).collect())
    }
}

impl KeyedMerger<ArrayShape> {
    /// An array merger matching items by `identity`.
    pub fn by(identity: ArrayIdentity) -> Self {
        Self::new(ArrayShape::new(identity))
    }

    /// An array merger matching items with a custom key function.
    pub fn with_key_fn(
        key_fn: impl Fn(&Value, usize, &Path) -> String + Send + Sync + 'static,
    ) -> Self {
        Self::new(ArrayShape::with_key_fn(key_fn))
    }
}
