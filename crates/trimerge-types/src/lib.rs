//! Foundation types for trimerge.
//!
//! This crate provides the path type shared by the diff and merge crates.
//! Every merge step is scoped to a [`Path`] so conflicts can be reported at the
//! exact node that could not be reconciled.
//!
//! # Key Types
//!
//! - [`Path`] -- Ordered key segments from the document root, rendered as a JSON pointer
//! - [`PathError`] -- Malformed pointer strings

pub mod error;
pub mod path;

pub use error::PathError;
pub use path::Path;
