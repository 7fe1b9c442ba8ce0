//! Typed key paths for addressing nested state.
//!
//! A [`KeyPath`] is an ordered list of segments. Object members are addressed
//! by key, array elements by their decimal index, so `board.3` is the fourth
//! element of the `board` array. The empty path is the root of the state and
//! is never reported by the diff engine.

use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between segments in the textual form of a key path.
pub const SEPARATOR: char = '.';

/// A dot-delimited address of a value at any depth of the state.
///
/// Ordering is segment-wise lexicographic, which places every path before
/// its descendants.
///
/// # Examples
///
/// ```
/// use reactive_store::KeyPath;
///
/// let path: KeyPath = "board.3".parse().unwrap();
/// assert_eq!(path, KeyPath::root().key("board").index(3));
/// assert_eq!(path.to_string(), "board.3");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The empty path, addressing the whole state.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dot-delimited path. Empty input and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        if path.is_empty() {
            return Err(StoreError::InvalidKeyPath(path.to_string()));
        }
        let segments: Vec<String> = path.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StoreError::InvalidKeyPath(path.to_string()));
        }
        Ok(Self(segments))
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append a key segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(key.into());
        self
    }

    /// Append an index segment and return self (builder pattern).
    #[inline]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(index.to_string());
        self
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment.into());
        Self(segments)
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The first segment, i.e. the slice this path lives in.
    pub fn top_level(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The last segment.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The parent path. `None` for the root; the root for top-level paths.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Strict ancestors from the nearest up to the top-level key.
    /// The root is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = KeyPath> + '_ {
        (1..self.0.len()).rev().map(move |len| Self(self.0[..len].to_vec()))
    }

    /// True if `self` is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &KeyPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// True if `self` is a strict extension of `other`.
    pub fn is_descendant_of(&self, other: &KeyPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// True if the paths are equal or one contains the other.
    pub fn overlaps(&self, other: &KeyPath) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = StoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        KeyPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
