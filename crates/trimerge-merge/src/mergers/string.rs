use serde_json::Value;
use trimerge_diff::DiffAlgorithm;
use trimerge_types::Path;

use crate::dispatcher::Dispatcher;
use crate::error::MergeResult;
use crate::merger::{Merger, Outcome};
use crate::text::merge_strings;

/// Three-way text merge of JSON strings.
///
/// Absent sides count as the empty string, so a field added as text on both
/// sides merges its two texts.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringMerger {
    algorithm: DiffAlgorithm,
}

impl StringMerger {
    pub fn new(algorithm: DiffAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> DiffAlgorithm {
        self.algorithm
    }
}

fn text(value: Option<&Value>) -> Option<&str> {
    match value {
        None => Some(""),
        Some(value) => value.as_str(),
    }
}

impl Merger<Value> for StringMerger {
    fn name(&self) -> &str {
        "string"
    }

    fn merge<'a>(
        &self,
        base: Option<&'a Value>,
        left: Option<&'a Value>,
        right: Option<&'a Value>,
        _path: &Path,
        _dispatcher: &Dispatcher<Value>,
    ) -> MergeResult<Outcome<'a, Value>> {
        let (Some(base), Some(left), Some(right)) = (text(base), text(left), text(right)) else {
            return Ok(Outcome::NotApplicable);
        };
        Ok(Outcome::owned(Value::String(merge_strings(
            base,
            left,
            right,
            self.algorithm,
        ))))
    }
}
