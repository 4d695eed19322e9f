//! Addresses of nodes inside a document subtree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::DataError;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(&escape(key)),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A synthetic root label followed by the key/index chain to a node.
///
/// The label names the traversal root for display; it is never resolved
/// against the document. Text form is `label/seg/seg` with `~0` and `~1`
/// escaping `~` and `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorPath {
    pub root: String,
    pub segments: Vec<PathSegment>,
}

impl ColorPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// Returns a copy extended by one segment.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self {
            root: self.root.clone(),
            segments,
        }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for ColorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(&self.root))?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Digits only, without a leading zero unless the segment is exactly `0`.
/// Other numeric-looking segments such as `007` or `+5` stay object keys.
fn canonical_index(part: &str) -> Option<usize> {
    let canonical = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'));
    if canonical {
        part.parse().ok()
    } else {
        None
    }
}

impl FromStr for ColorPath {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let root = match parts.next() {
            Some(root) if !root.is_empty() => unescape(root),
            _ => return Err(DataError::InvalidPath(s.to_string())),
        };
        let segments = parts
            .map(|part| match canonical_index(part) {
                Some(index) => PathSegment::Index(index),
                None => PathSegment::Key(unescape(part)),
            })
            .collect();
        Ok(Self { root, segments })
    }
}

impl Serialize for ColorPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn escape(raw: &str) -> String {
    raw.replace('~', "~0").replace('/', "~1")
}

fn unescape(raw: &str) -> String {
    raw.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let path = ColorPath::new("Layer 0")
            .child(PathSegment::Index(1))
            .child(PathSegment::Key("it".into()))
            .child(PathSegment::Index(0));
        assert_eq!(path.to_string(), "Layer 0/1/it/0");
        assert_eq!(path.to_string().parse::<ColorPath>().unwrap(), path);
    }

    #[test]
    fn slashes_in_keys_are_escaped() {
        let path = ColorPath::new("a/b").child(PathSegment::Key("x~y/z".into()));
        let text = path.to_string();
        assert_eq!(text, "a~1b/x~0y~1z");
        assert_eq!(text.parse::<ColorPath>().unwrap(), path);
    }

    #[test]
    fn only_canonical_numbers_become_indices() {
        let path: ColorPath = "root/0/12/007/+5/00".parse().unwrap();
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Index(0),
                PathSegment::Index(12),
                PathSegment::Key("007".into()),
                PathSegment::Key("+5".into()),
                PathSegment::Key("00".into()),
            ]
        );

        let keyed = ColorPath::new("root").child(PathSegment::Key("007".into()));
        assert_eq!(keyed.to_string().parse::<ColorPath>().unwrap(), keyed);
    }

    #[test]
    fn empty_root_is_rejected() {
        assert!("".parse::<ColorPath>().is_err());
        assert!("/it/0".parse::<ColorPath>().is_err());
    }

    #[test]
    fn serializes_as_text() {
        let path: ColorPath = "Layer 2/0/it/3".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"Layer 2/0/it/3\"");
        let back: ColorPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
