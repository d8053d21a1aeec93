//! Three-way text merge with optional annotation ranges.
//!
//! Text is classified with diff3 over `char`s. Unchanged and one-sided
//! regions are copied through. For a conflicting region, if one side's text
//! is the base text plus a pure prefix or suffix, the base core is stripped
//! from that side so it is not emitted twice; otherwise left and right are
//! concatenated in full.
//!
//! Annotations are tagged spans over the text (cursors, selections,
//! formatting runs). They follow the text they cover into the merged output.
//! All offsets are in `char`s.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use trimerge_diff::{diff3_merge_indices_with, DiffAlgorithm, MergeIndex, Side};

/// A tagged span `[start, end)` over a text. A collapsed span
/// (`start == end`) marks a position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation<T> {
    pub start: usize,
    pub end: usize,
    pub value: T,
}

impl<T> Annotation<T> {
    pub fn new(start: usize, end: usize, value: T) -> Self {
        Self { start, end, value }
    }

    /// Returns `true` for a position marker.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Annotations over each of the three input texts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextAnnotations<T> {
    pub base: Vec<Annotation<T>>,
    pub left: Vec<Annotation<T>>,
    pub right: Vec<Annotation<T>>,
}

impl<T> Default for TextAnnotations<T> {
    fn default() -> Self {
        Self {
            base: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
        }
    }
}

/// Merged text with annotations in merged-text coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedText<T> {
    pub text: String,
    pub annotations: Vec<Annotation<T>>,
}

/// Merge three versions of a text.
///
/// # Examples
///
/// ```
/// use trimerge_diff::DiffAlgorithm;
/// use trimerge_merge::merge_strings;
///
/// let merged = merge_strings("two", "one", "two three", DiffAlgorithm::Myers);
/// assert_eq!(merged, "one three");
/// ```
pub fn merge_strings(base: &str, left: &str, right: &str, algorithm: DiffAlgorithm) -> String {
    merge_annotated::<()>(base, left, right, &TextAnnotations::default(), algorithm).text
}

/// Merge three versions of a text, carrying annotations along.
pub fn merge_annotated<T: Clone>(
    base: &str,
    left: &str,
    right: &str,
    annotations: &TextAnnotations<T>,
    algorithm: DiffAlgorithm,
) -> MergedText<T> {
    let base: Vec<char> = base.chars().collect();
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();

    let mut out = TextBuilder::new(annotations);
    for entry in diff3_merge_indices_with(&base, &left, &right, algorithm) {
        match entry {
            MergeIndex::Common { base: range, .. } => out.copy(Source::Base, &base, range),
            MergeIndex::SingleSide {
                side: Side::Left,
                range,
            } => out.copy(Source::Left, &left, range),
            MergeIndex::SingleSide {
                side: Side::Right,
                range,
            } => out.copy(Source::Right, &right, range),
            MergeIndex::Conflict {
                base: base_range,
                left: left_range,
                right: right_range,
            } => {
                let (left_range, right_range) =
                    strip_shared_core(&base[base_range], &left, left_range, &right, right_range);
                out.copy(Source::Left, &left, left_range);
                out.copy(Source::Right, &right, right_range);
            }
        }
    }
    out.finish()
}

/// Narrow a conflict's side ranges so a base core kept by one side (with
/// only a prefix or suffix added) is emitted once.
fn strip_shared_core(
    core: &[char],
    left: &[char],
    left_range: Range<usize>,
    right: &[char],
    right_range: Range<usize>,
) -> (Range<usize>, Range<usize>) {
    let n = core.len();
    if n == 0 {
        return (left_range, right_range);
    }
    let left_part = &left[left_range.clone()];
    let right_part = &right[right_range.clone()];
    if left_part.starts_with(core) {
        (left_range.start + n..left_range.end, right_range)
    } else if right_part.starts_with(core) {
        (left_range, right_range.start + n..right_range.end)
    } else if left_part.ends_with(core) {
        (left_range.start..left_range.end - n, right_range)
    } else if right_part.ends_with(core) {
        (left_range, right_range.start..right_range.end - n)
    } else {
        (left_range, right_range)
    }
}

/// Re-base the annotations overlapping `[start, end)` onto a slice of the
/// text that begins at `offset` in the output.
///
/// Spanning annotations are clipped to the slice; position markers are kept
/// if they fall anywhere in `[start, end]`.
pub fn slice_annotations<T: Clone>(
    annotations: &[Annotation<T>],
    start: usize,
    end: usize,
    offset: usize,
) -> Vec<Annotation<T>> {
    annotations
        .iter()
        .filter_map(|annotation| rebase(annotation, start, end, offset))
        .collect()
}

fn rebase<T: Clone>(
    annotation: &Annotation<T>,
    start: usize,
    end: usize,
    offset: usize,
) -> Option<Annotation<T>> {
    if annotation.is_collapsed() {
        if annotation.start < start || annotation.start > end {
            return None;
        }
        let at = offset + annotation.start - start;
        return Some(Annotation::new(at, at, annotation.value.clone()));
    }
    if annotation.start >= end || annotation.end <= start {
        return None;
    }
    Some(Annotation::new(
        offset + annotation.start.max(start) - start,
        offset + annotation.end.min(end) - start,
        annotation.value.clone(),
    ))
}

#[derive(Clone, Copy)]
enum Source {
    Base,
    Left,
    Right,
}

struct TextBuilder<'t, T> {
    text: String,
    len: usize,
    annotations: &'t TextAnnotations<T>,
    out: Vec<Annotation<T>>,
    // Position markers already emitted, by index, per source.
    placed: [HashSet<usize>; 3],
}

impl<'t, T: Clone> TextBuilder<'t, T> {
    fn new(annotations: &'t TextAnnotations<T>) -> Self {
        Self {
            text: String::new(),
            len: 0,
            annotations,
            out: Vec::new(),
            placed: Default::default(),
        }
    }

    fn copy(&mut self, source: Source, chars: &[char], range: Range<usize>) {
        let all: &'t TextAnnotations<T> = self.annotations;
        let (annotations, placed) = match source {
            Source::Base => (&all.base, &mut self.placed[0]),
            Source::Left => (&all.left, &mut self.placed[1]),
            Source::Right => (&all.right, &mut self.placed[2]),
        };
        for (index, annotation) in annotations.iter().enumerate() {
            if annotation.is_collapsed() && placed.contains(&index) {
                continue;
            }
            if let Some(rebased) = rebase(annotation, range.start, range.end, self.len) {
                if annotation.is_collapsed() {
                    placed.insert(index);
                }
                self.out.push(rebased);
            }
        }
        self.len += range.len();
        self.text.extend(&chars[range]);
    }

    fn finish(self) -> MergedText<T> {
        MergedText {
            text: self.text,
            annotations: self.out,
        }
    }
}
