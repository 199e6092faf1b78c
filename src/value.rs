//! Concrete input trees and the paths that address their nodes.
//!
//! An [`InputValue`] always mirrors the [`AbiType`](crate::ir::AbiType) it was
//! built for: scalars are leaves, arrays and tuples are ordered lists, structs
//! are name-ordered maps. A program's full input is an [`InputMap`] keyed by
//! parameter name, so the first [`PathSegment`] of every path is a parameter.
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::PathParseError;

// ————————————————————————————————————————————————————————————————————————————
// VALUES
// ————————————————————————————————————————————————————————————————————————————

/// Numbers keep the exact digits they were written with, so field elements
/// wider than 64 bits round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(Number),
    Bool(bool),
    Str(String),
    List(Vec<InputValue>),
    Struct(IndexMap<String, InputValue>),
}

/// Parameter name → value, in declared parameter order.
pub type InputMap = IndexMap<String, InputValue>;

impl InputValue {
    pub fn zero() -> Self { Self::Number(Number::from(0u8)) }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Struct(_) => "object",
        }
    }

    /// Child addressed by one segment, if this node has it.
    pub fn get(&self, segment: &PathSegment) -> Option<&InputValue> {
        match (self, segment) {
            (Self::List(items), PathSegment::Index(i)) => items.get(*i),
            (Self::Struct(fields), PathSegment::Key(k)) => fields.get(k),
            _ => None,
        }
    }

    pub fn get_path(&self, segments: &[PathSegment]) -> Option<&InputValue> {
        segments.iter().try_fold(self, |node, seg| node.get(seg))
    }

    /// Text a user would type to reproduce this value in an input box.
    /// Strings are taken verbatim; everything else is JSON.
    pub fn to_raw_input(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl TryFrom<Value> for InputValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => return Err("null is not an input value".into()),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?),
            Value::Object(fields) => Self::Struct(
                fields
                    .into_iter()
                    .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

// Goes through `Value`, which understands serde_json's exact-number encoding
// at any nesting depth.
impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::try_from(Value::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

/// Node lookup through an input map; the first segment names the parameter.
pub fn lookup<'a>(inputs: &'a InputMap, path: &Path) -> Option<&'a InputValue> {
    let (head, rest) = path.segments().split_first()?;
    let PathSegment::Key(name) = head else { return None };
    inputs.get(name)?.get_path(rest)
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for InputValue {
    fn from(n: i64) -> Self { Self::Number(Number::from(n)) }
}

impl From<u64> for InputValue {
    fn from(n: u64) -> Self { Self::Number(Number::from(n)) }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<Vec<InputValue>> for InputValue {
    fn from(items: Vec<InputValue>) -> Self { Self::List(items) }
}

// ————————————————————————————————————————————————————————————————————————————
// PATHS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// Root-relative address of one node. Serializes as a JSON array of segments,
/// e.g. `["point","tags",1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self { Self::default() }

    pub fn segments(&self) -> &[PathSegment] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Stable key form used for error bookkeeping.
    pub fn serialized(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Like `Display`, but names the root explicitly.
    pub fn describe(&self) -> String {
        if self.is_empty() { "<root>".to_string() } else { self.to_string() }
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self { Self::Index(i) }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self { Self::Key(k.to_string()) }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self { Self::Key(k) }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Key(k) if i == 0 => f.write_str(k)?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(ix) => write!(f, "[{ix}]")?,
            }
        }
        Ok(())
    }
}

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([A-Za-z_][A-Za-z0-9_]*)|\[(\d+)\]|(\d+))").expect("segment pattern compiles")
});

/// Parses `param.field[2].inner`; `pair.0` is accepted as an index too.
impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| PathParseError { input: src.to_string(), reason: reason.to_string() };
        let mut segments = Vec::new();
        let mut rest = src.trim();
        while !rest.is_empty() {
            let caps = SEGMENT.captures(rest).ok_or_else(|| fail("expected a name or [index]"))?;
            if let Some(key) = caps.get(1) {
                segments.push(PathSegment::Key(key.as_str().to_string()));
            } else {
                let digits = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str()).unwrap_or_default();
                let index = digits.parse::<usize>().map_err(|_| fail("index out of range"))?;
                segments.push(PathSegment::Index(index));
            }
            let consumed = caps.get(0).map(|m| m.end()).unwrap_or(rest.len());
            rest = &rest[consumed..];
            if let Some(tail) = rest.strip_prefix('.') {
                if tail.is_empty() { return Err(fail("trailing '.'")) }
                rest = tail;
            } else if !rest.is_empty() && !rest.starts_with('[') {
                return Err(fail("segments must be separated by '.' or '['"));
            }
        }
        Ok(Self(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_text_round_trip() {
        let path: Path = "point.tags[1].name".parse().unwrap();
        assert_eq!(path, Path::from_iter([
            PathSegment::from("point"),
            PathSegment::from("tags"),
            PathSegment::from(1usize),
            PathSegment::from("name"),
        ]));
        assert_eq!(path.to_string(), "point.tags[1].name");
        assert_eq!(path.serialized(), r#"["point","tags",1,"name"]"#);
    }

    #[test]
    fn dotted_index_and_bad_paths() {
        let path: Path = "pair.0".parse().unwrap();
        assert_eq!(path.segments()[1], PathSegment::Index(0));
        assert!("a..b".parse::<Path>().is_err());
        assert!("a.".parse::<Path>().is_err());
        assert!("a[x]".parse::<Path>().is_err());
        assert!("a[0]b".parse::<Path>().is_err());
        assert!("".parse::<Path>().unwrap().is_empty());
    }

    #[test]
    fn lookup_through_parameters() {
        let inputs: InputMap = serde_json::from_value(json!({
            "point": { "x": 3, "tags": ["ab", "cd"] },
            "flag": true
        })).unwrap();
        let path: Path = "point.tags[1]".parse().unwrap();
        assert_eq!(lookup(&inputs, &path), Some(&InputValue::from("cd")));
        assert_eq!(lookup(&inputs, &"point.y".parse().unwrap()), None);
        assert_eq!(lookup(&inputs, &"flag[0]".parse().unwrap()), None);
    }

    #[test]
    fn inputs_files_keep_wide_numbers() {
        let src = r#"{"root": 21888242871839275222246405745257275088548364400416034343698204186575808495617, "xs": [1, -0]}"#;
        let inputs: InputMap = serde_json::from_str(src).unwrap();
        assert_eq!(serde_json::to_string(&inputs).unwrap(), src.replace(", ", ",").replace(": ", ":"));
        assert!(serde_json::from_str::<InputMap>(r#"{"a": null}"#).is_err());
    }

    #[test]
    fn raw_input_text() {
        assert_eq!(InputValue::from("abc").to_raw_input(), "abc");
        assert_eq!(InputValue::from(vec![InputValue::from(true), InputValue::zero()]).to_raw_input(), "[true,0]");
    }
}
