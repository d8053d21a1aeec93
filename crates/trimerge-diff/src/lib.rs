//! Diff engine for trimerge.
//!
//! Provides the two-way sequence differ, the three-way hunk classification
//! built on top of it, and a standalone JSON diff/patch format.
//!
//! # Key Types
//!
//! - [`Segment`] / [`DiffAlgorithm`] -- Two-way mismatched regions (LCS or Myers)
//! - [`MergeIndex`] / [`Side`] -- diff3 classification into common, one-sided and
//!   conflicting regions
//! - [`PatchOperation`] / [`SpliceInsert`] -- Replayable set/splice edits between two
//!   JSON documents

pub mod diff3;
pub mod error;
pub mod patch;
pub mod sequence;

pub use diff3::{diff3_merge_indices, diff3_merge_indices_with, MergeIndex, Side};
pub use error::{DiffError, DiffResult};
pub use patch::{apply_patch, diff_values, PatchOperation, SpliceInsert};
pub use sequence::{diff_indices, diff_sequences, DiffAlgorithm, Segment};
