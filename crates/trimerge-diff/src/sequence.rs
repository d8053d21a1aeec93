//! Two-way sequence diff: the mismatched regions between two sequences.
//!
//! The default algorithm is Hunt–McIlroy longest common subsequence over
//! candidate chains: every element of `b` is indexed by value, `a` is scanned
//! left to right, and each match extends the longest chain whose tail sits at
//! a smaller `b` index (found by binary search over the chain tails). The
//! winning chain is recovered by walking its back-links.
//!
//! For text the `similar` crate's Myers implementation is available as a
//! faster alternative. Both satisfy the same coverage contract but may place
//! hunk boundaries differently when several minimal edit scripts exist.
//!
//! Equal inputs short-circuit to "no segments", and a shared prefix and
//! suffix are always stripped before any algorithm runs.
//!
//! Candidate chains cost one node per matching pair, which is quadratic for
//! inputs made of a few repeated values. When the number of matching pairs
//! exceeds a small multiple of the input length, the LCS algorithm hands the
//! remaining middle over to Myers.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use similar::algorithms::{myers, Capture};
use similar::DiffTag;

/// Which algorithm computes the edit script.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAlgorithm {
    /// Hunt–McIlroy LCS over candidate chains.
    #[default]
    Lcs,
    /// Myers O(ND) diff from the `similar` crate.
    Myers,
}

/// A contiguous mismatch between a base sequence and one side.
///
/// Both ranges are half-open. The stretches between consecutive segments are
/// element-for-element matches, so either range may be empty (a pure
/// insertion or a pure deletion) but never both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Range in the base sequence.
    pub base: Range<usize>,
    /// Range in the side sequence.
    pub side: Range<usize>,
}

impl Segment {
    /// Create a segment from its two ranges.
    pub fn new(base: Range<usize>, side: Range<usize>) -> Self {
        Self { base, side }
    }

    /// Returns `true` if the side adds elements without removing any.
    pub fn is_insertion(&self) -> bool {
        self.base.is_empty()
    }

    /// Returns `true` if the side removes elements without adding any.
    pub fn is_deletion(&self) -> bool {
        self.side.is_empty()
    }

    fn shifted(self, base_offset: usize, side_offset: usize) -> Self {
        Self {
            base: self.base.start + base_offset..self.base.end + base_offset,
            side: self.side.start + side_offset..self.side.end + side_offset,
        }
    }
}

/// Diff two sequences with the LCS algorithm.
///
/// # Examples
///
/// ```
/// use trimerge_diff::{diff_indices, Segment};
///
/// let segments = diff_indices(&[1, 2, 3], &[1, 4, 3]);
/// assert_eq!(segments, vec![Segment::new(1..2, 1..2)]);
/// ```
pub fn diff_indices<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Segment> {
    diff_sequences(a, b, DiffAlgorithm::Lcs)
}

/// Diff two sequences with the chosen algorithm.
pub fn diff_sequences<T: Eq + Hash>(
    a: &[T],
    b: &[T],
    algorithm: DiffAlgorithm,
) -> Vec<Segment> {
    if std::ptr::eq(a, b) || a == b {
        return Vec::new();
    }

    let prefix = common_prefix(a, b);
    let suffix = common_suffix(&a[prefix..], &b[prefix..]);
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    // A pure insertion or deletion needs no matching at all.
    if a_mid.is_empty() || b_mid.is_empty() {
        return vec![Segment::new(
            prefix..prefix + a_mid.len(),
            prefix..prefix + b_mid.len(),
        )];
    }

    let segments = match algorithm {
        DiffAlgorithm::Lcs => lcs_segments(a_mid, b_mid),
        DiffAlgorithm::Myers => myers_segments(a_mid, b_mid),
    };

    segments
        .into_iter()
        .map(|segment| segment.shifted(prefix, prefix))
        .collect()
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

// ---------------------------------------------------------------------------
// Hunt–McIlroy LCS
// ---------------------------------------------------------------------------

/// A matched pair `(a, b)` linked to the previous match of its chain.
struct Candidate {
    a: usize,
    b: usize,
    chain: Option<usize>,
}

/// Matching pairs allowed per input element before falling back to Myers.
const MATCHES_PER_ELEMENT: usize = 8;

/// Matching pairs always allowed, so short inputs keep exact LCS hunks.
const MATCHES_FLOOR: usize = 1 << 12;

fn lcs_segments<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Segment> {
    let mut positions: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in b.iter().enumerate() {
        positions.entry(item).or_default().push(j);
    }

    let budget = MATCHES_PER_ELEMENT * (a.len() + b.len()) + MATCHES_FLOOR;
    let mut matches = 0usize;
    for item in a {
        matches += positions.get(item).map_or(0, Vec::len);
        if matches > budget {
            return myers_segments(a, b);
        }
    }

    segments_between(&lcs(a, &positions), a.len(), b.len())
}

/// Matched index pairs of a longest common subsequence, in ascending order.
///
/// `positions` maps every element of `b` to its indices in ascending order.
fn lcs<T: Eq + Hash>(a: &[T], positions: &HashMap<&T, Vec<usize>>) -> Vec<(usize, usize)> {
    // `tails[k]` is the candidate ending the best chain of length `k + 1`;
    // their `b` indices are strictly increasing.
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut tails: Vec<usize> = Vec::new();

    for (i, item) in a.iter().enumerate() {
        let Some(matches) = positions.get(item) else {
            continue;
        };
        // Descending so one `a` element never extends a chain it just joined.
        for &j in matches.iter().rev() {
            let k = tails.partition_point(|&t| candidates[t].b < j);
            if k < tails.len() && candidates[tails[k]].b == j {
                continue;
            }
            let chain = k.checked_sub(1).map(|prev| tails[prev]);
            candidates.push(Candidate { a: i, b: j, chain });
            let id = candidates.len() - 1;
            if k == tails.len() {
                tails.push(id);
            } else {
                tails[k] = id;
            }
        }
    }

    let mut matched = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(id) = cursor {
        let candidate = &candidates[id];
        matched.push((candidate.a, candidate.b));
        cursor = candidate.chain;
    }
    matched.reverse();
    matched
}

/// Turn matched pairs into the mismatched gaps between them.
fn segments_between(matched: &[(usize, usize)], a_len: usize, b_len: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let (mut a_next, mut b_next) = (0, 0);
    for (a_match, b_match) in matched.iter().copied().chain(std::iter::once((a_len, b_len))) {
        if a_match > a_next || b_match > b_next {
            segments.push(Segment::new(a_next..a_match, b_next..b_match));
        }
        a_next = a_match + 1;
        b_next = b_match + 1;
    }
    segments
}

// ---------------------------------------------------------------------------
// Myers (via `similar`)
// ---------------------------------------------------------------------------

fn myers_segments<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Segment> {
    let mut capture = Capture::new();
    // Capturing never fails.
    let _ = myers::diff(&mut capture, a, 0..a.len(), b, 0..b.len());

    let mut segments: Vec<Segment> = Vec::new();
    for op in capture.into_ops() {
        if matches!(op.tag(), DiffTag::Equal) {
            continue;
        }
        let (base, side) = (op.old_range(), op.new_range());
        // A delete directly followed by an insert is one replacement.
        match segments.last_mut() {
            Some(last) if last.base.end == base.start && last.side.end == side.start => {
                last.base.end = base.end;
                last.side.end = side.end;
            }
            _ => segments.push(Segment::new(base, side)),
        }
    }
    segments
}
