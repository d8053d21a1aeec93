use serde_json::{Map, Value};
use trimerge_types::Path;

use super::keyed::{KeyedMerger, KeyedShape};

/// JSON objects, keyed by field name.
///
/// A missing base object is treated as `{}`, so two sides that add the same
/// object concurrently still merge field by field.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectShape;

/// Field-by-field merge of JSON objects.
pub type ObjectMerger = KeyedMerger<ObjectShape>;

impl KeyedShape<Value> for ObjectShape {
    type Key = String;

    fn name(&self) -> &str {
        "object"
    }

    fn entries<'a>(&self, value: &'a Value, _path: &Path) -> Option<Vec<(String, &'a Value)>> {
        let object = value.as_object()?;
        Some(object.iter().map(|(key, value)| (key.clone(), value)).collect())
    }

    fn build(&self, entries: Vec<(String, Value)>) -> Value {
        Value::Object(entries.into_iter().collect::<Map<String, Value>>())
    }

    fn absent_base_is_empty(&self) -> bool {
        true
    }
}
