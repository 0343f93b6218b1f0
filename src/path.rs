//! Paths addressing nodes inside a YAML document.
//!
//! A path is a list of mapping keys and sequence indices, written as
//! `server.customMiddleware`, `configuration.backend[0].url` or
//! `configuration.backend.0.url`.

use crate::error::{YamlError, YamlResult};
use std::fmt;
use std::str::FromStr;

/// One step of a [`YamlPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key
    Key(String),
    /// A sequence index
    Index(usize),
}

impl PathSegment {
    /// The index this segment selects in a sequence. Numeric keys count as
    /// indices.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(key) => key.parse().ok(),
        }
    }

    /// The key this segment selects in a mapping.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }

    /// Whether two segments select the same node.
    pub fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (PathSegment::Key(a), PathSegment::Key(b)) => a == b,
            _ => self.as_index().is_some() && self.as_index() == other.as_index(),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A path from a node down to one of its descendants. The empty path
/// addresses the node itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct YamlPath(Vec<PathSegment>);

impl YamlPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path; see the module docs for the syntax.
    pub fn parse(path: &str) -> YamlResult<Self> {
        let invalid = |reason: String| YamlError::path_resolution(path, reason);

        let mut segments = Vec::new();
        if path.is_empty() {
            return Ok(Self(segments));
        }

        for (i, part) in path.split('.').enumerate() {
            let (key, mut rest) = match part.find('[') {
                Some(bracket) => (&part[..bracket], &part[bracket..]),
                None => (part, ""),
            };

            if key.is_empty() {
                // Only a leading index may stand without a key, as in `[0].name`
                if rest.is_empty() || i > 0 {
                    return Err(invalid("empty path segment".to_string()));
                }
            } else {
                segments.push(PathSegment::Key(key.to_string()));
            }

            while !rest.is_empty() {
                let (index, remaining) = rest
                    .strip_prefix('[')
                    .and_then(|inner| inner.find(']').map(|end| (&inner[..end], &inner[end + 1..])))
                    .ok_or_else(|| invalid(format!("unbalanced brackets in '{}'", part)))?;
                let index = index
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a sequence index", index)))?;
                segments.push(PathSegment::Index(index));
                rest = remaining;
            }
        }

        Ok(Self(segments))
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this is the empty path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one segment.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// This path followed by all segments of `other`.
    pub fn concat(&self, other: &YamlPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether both paths select the same node.
    pub fn matches(&self, other: &YamlPath) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.matches(b))
    }
}

impl FromStr for YamlPath {
    type Err = YamlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<PathSegment>> for YamlPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for YamlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
