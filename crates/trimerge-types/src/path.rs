use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Location of a node inside a document, from the root down.
///
/// Segments are object field names, map keys, or the identity keys derived
/// for array items. A `Path` renders as a JSON pointer (`/a/b/c`), with `~`
/// and `/` inside segments escaped as `~0` and `~1`. The root path renders
/// as the empty string, so `/` is the path to the empty key.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path(Vec<String>);

impl Path {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// A new path one level deeper.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment.into());
        Self(segments)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments (the depth below the root).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Parse a JSON pointer.
    ///
    /// `""` parses to the root. Any other pointer must start with `/`;
    /// `~0` and `~1` decode to `~` and `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trimerge_types::Path;
    ///
    /// let path = Path::parse("/canvas/shapes").unwrap();
    /// assert_eq!(path.segments(), ["canvas", "shapes"]);
    /// assert_eq!(path.to_string(), "/canvas/shapes");
    /// assert_eq!(Path::parse("/").unwrap().segments(), [""]);
    /// assert!(Path::parse("canvas").is_err());
    /// ```
    pub fn parse(pointer: &str) -> Result<Self, PathError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PathError::MissingLeadingSlash(pointer.to_string()))?;
        rest.split('/')
            .map(unescape_segment)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

fn unescape_segment(raw: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(PathError::InvalidEscape {
                    segment: raw.to_string(),
                })
            }
        }
    }
    Ok(out)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}
