//! Three-way hunk classification (diff3).
//!
//! Both descendants are diffed against the base, the two hunk lists are
//! merged by base position, and hunks whose base ranges overlap or touch are
//! grouped into clusters. A cluster of one hunk is a change by one side only;
//! a cluster of two or more is a conflict spanning every hunk in it. The
//! stretches between clusters are common to all three inputs.
//!
//! Nothing is resolved here. Callers decide what to do with each
//! [`MergeIndex`] entry.

use std::hash::Hash;
use std::ops::Range;

use crate::sequence::{diff_sequences, DiffAlgorithm, Segment};

/// One of the two descendants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The opposite side.
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A classified region of a three-way comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeIndex {
    /// Unchanged on both sides. All three ranges have the same length.
    Common {
        base: Range<usize>,
        left: Range<usize>,
        right: Range<usize>,
    },
    /// Content that one side introduced in a region the other side left
    /// untouched. Pure deletions produce no entry.
    SingleSide { side: Side, range: Range<usize> },
    /// Overlapping changes by both sides.
    Conflict {
        base: Range<usize>,
        left: Range<usize>,
        right: Range<usize>,
    },
}

impl MergeIndex {
    /// Returns `true` for [`MergeIndex::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, MergeIndex::Conflict { .. })
    }

    /// The range this entry covers in the given side, if it references one.
    pub fn side_range(&self, side: Side) -> Option<Range<usize>> {
        match self {
            MergeIndex::Common { left, right, .. } | MergeIndex::Conflict { left, right, .. } => {
                Some(match side {
                    Side::Left => left.clone(),
                    Side::Right => right.clone(),
                })
            }
            MergeIndex::SingleSide { side: owner, range } => {
                (*owner == side).then(|| range.clone())
            }
        }
    }

    /// The range this entry covers in the base, if it references one.
    pub fn base_range(&self) -> Option<Range<usize>> {
        match self {
            MergeIndex::Common { base, .. } | MergeIndex::Conflict { base, .. } => {
                Some(base.clone())
            }
            MergeIndex::SingleSide { .. } => None,
        }
    }
}

/// Classify `base`/`left`/`right` using the LCS differ.
///
/// # Examples
///
/// ```
/// use trimerge_diff::{diff3_merge_indices, MergeIndex, Side};
///
/// let base: Vec<char> = "".chars().collect();
/// let left: Vec<char> = "hello".chars().collect();
/// let entries = diff3_merge_indices(&base, &left, &base);
/// assert_eq!(entries, vec![MergeIndex::SingleSide { side: Side::Left, range: 0..5 }]);
/// ```
pub fn diff3_merge_indices<T: Eq + Hash>(base: &[T], left: &[T], right: &[T]) -> Vec<MergeIndex> {
    diff3_merge_indices_with(base, left, right, DiffAlgorithm::Lcs)
}

/// Classify `base`/`left`/`right` using the chosen two-way algorithm.
pub fn diff3_merge_indices_with<T: Eq + Hash>(
    base: &[T],
    left: &[T],
    right: &[T],
    algorithm: DiffAlgorithm,
) -> Vec<MergeIndex> {
    let mut hunks: Vec<Hunk> = diff_sequences(base, left, algorithm)
        .into_iter()
        .map(|segment| Hunk::new(Side::Left, segment))
        .chain(
            diff_sequences(base, right, algorithm)
                .into_iter()
                .map(|segment| Hunk::new(Side::Right, segment)),
        )
        .collect();
    // Stable: left hunks stay ahead of right hunks at the same base start.
    hunks.sort_by_key(|hunk| hunk.base.start);

    let mut walker = Walker::default();
    let mut next = 0;
    while next < hunks.len() {
        let first = next;
        let region_start = hunks[first].base.start;
        let mut region_end = hunks[first].base.end;
        while next + 1 < hunks.len() && hunks[next + 1].base.start <= region_end {
            next += 1;
            region_end = region_end.max(hunks[next].base.end);
        }

        walker.copy_common(region_start);
        match &hunks[first..=next] {
            [hunk] => walker.single_side(hunk, region_end),
            cluster => walker.conflict(cluster, region_start..region_end),
        }
        next += 1;
    }
    walker.copy_common(base.len());
    walker.entries
}

/// A two-way segment tagged with the side it came from.
struct Hunk {
    side: Side,
    base: Range<usize>,
    range: Range<usize>,
}

impl Hunk {
    fn new(side: Side, segment: Segment) -> Self {
        Self {
            side,
            base: segment.base,
            range: segment.side,
        }
    }
}

/// Running offsets into the three inputs plus the entries emitted so far.
#[derive(Default)]
struct Walker {
    base: usize,
    left: usize,
    right: usize,
    entries: Vec<MergeIndex>,
}

impl Walker {
    fn offset_mut(&mut self, side: Side) -> &mut usize {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Emit the unchanged stretch up to `target` in base coordinates.
    fn copy_common(&mut self, target: usize) {
        if target <= self.base {
            return;
        }
        let delta = target - self.base;
        self.entries.push(MergeIndex::Common {
            base: self.base..target,
            left: self.left..self.left + delta,
            right: self.right..self.right + delta,
        });
        self.base = target;
        self.left += delta;
        self.right += delta;
    }

    fn single_side(&mut self, hunk: &Hunk, region_end: usize) {
        if !hunk.range.is_empty() {
            self.entries.push(MergeIndex::SingleSide {
                side: hunk.side,
                range: hunk.range.clone(),
            });
        }
        let delta = region_end - self.base;
        self.base = region_end;
        *self.offset_mut(hunk.side) = hunk.range.end;
        *self.offset_mut(hunk.side.other()) += delta;
    }

    fn conflict(&mut self, cluster: &[Hunk], region: Range<usize>) {
        let left = self.extent(cluster, Side::Left, &region);
        let right = self.extent(cluster, Side::Right, &region);
        self.base = region.end;
        self.left = left.end;
        self.right = right.end;
        self.entries.push(MergeIndex::Conflict {
            base: region,
            left,
            right,
        });
    }

    /// The side range a conflict region covers.
    ///
    /// The side's own hunks are merged into one span, then widened by the
    /// base elements of the region that this side kept unchanged on either
    /// end. A side without hunks in the cluster tracks the base 1:1.
    fn extent(&self, cluster: &[Hunk], side: Side, region: &Range<usize>) -> Range<usize> {
        let span = cluster
            .iter()
            .filter(|hunk| hunk.side == side)
            .fold(None, |span: Option<(Range<usize>, Range<usize>)>, hunk| {
                Some(match span {
                    None => (hunk.base.clone(), hunk.range.clone()),
                    Some((base, range)) => (
                        base.start.min(hunk.base.start)..base.end.max(hunk.base.end),
                        range.start.min(hunk.range.start)..range.end.max(hunk.range.end),
                    ),
                })
            });
        match span {
            Some((base, range)) => {
                range.start - (base.start - region.start)..range.end + (region.end - base.end)
            }
            None => {
                let offset = match side {
                    Side::Left => self.left,
                    Side::Right => self.right,
                };
                offset..offset + region.len()
            }
        }
    }
}
