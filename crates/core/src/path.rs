//! Document paths
//!
//! This module defines:
//! - DocPath: Location inside a document (`address.city`, `hobbies[1]`)
//! - PathSegment: Individual path component (Key or Index)
//! - Path operations used to apply document patches
//!
//! # Path Syntax
//!
//! | Syntax | Meaning | Example |
//! |--------|---------|---------|
//! | `key` | Document field | `name` |
//! | `a.b` | Nested field | `address.city` |
//! | `key[n]` | Array element | `hobbies[0]` |
//! | `$.key` | Same as `key` | `$.name` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::value::Value;

/// Error type for document path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Path string was empty
    #[error("empty document path")]
    Empty,
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// A segment in a document path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Document field: `.foo`
    Key(String),
    /// Array element: `[0]`
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A non-empty path into a document
///
/// # Examples
///
/// ```
/// use fluentdb_core::DocPath;
///
/// let path: DocPath = "hobbies[1]".parse().unwrap();
/// assert!(path.is_array_element());
///
/// let column: DocPath = "name".parse().unwrap();
/// assert!(column.is_plain_field());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// Single-field path.
    pub fn field(name: impl Into<String>) -> Self {
        DocPath {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    /// Path from already split segments; `None` when empty.
    pub fn from_segments(segments: Vec<PathSegment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(DocPath { segments })
        }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Parsed paths always hold at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment is an array index.
    pub fn is_array_element(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Index(_)))
    }

    /// Exactly one key segment; the only form accepted as a table column.
    pub fn is_plain_field(&self) -> bool {
        matches!(self.segments.as_slice(), [PathSegment::Key(_)])
    }

    /// Name of a plain field path.
    pub fn field_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [PathSegment::Key(k)] => Some(k),
            _ => None,
        }
    }

    fn split_last(&self) -> Option<(&[PathSegment], &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((parent, last))
    }
}

impl FromStr for DocPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        if chars.first() == Some(&'$') {
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
        }
        if i >= chars.len() {
            return Err(PathParseError::Empty);
        }

        let mut segments = Vec::new();
        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() || chars[i] == '.' || chars[i] == '[' {
                    return Err(PathParseError::EmptyKey(i));
                }
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }
                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;
                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                segments.push(PathSegment::Key(chars[key_start..i].iter().collect()));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        Ok(DocPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Path Operations
// =============================================================================

/// Error type for path operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Type mismatch during path traversal
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Path being applied
        path: String,
        /// Expected type
        expected: &'static str,
        /// Actual type found
        found: &'static str,
    },

    /// Array index out of bounds
    #[error("index out of bounds at '{path}': {index} > {len}")]
    IndexOutOfBounds {
        /// Path being applied
        path: String,
        /// The requested index
        index: usize,
        /// The array length
        len: usize,
    },

    /// Path not found
    #[error("path not found: {0}")]
    NotFound(String),
}

/// Get value at path within a document
pub fn get_at_path<'a>(root: &'a Value, path: &DocPath) -> Option<&'a Value> {
    root.at(path)
}

/// Mutable reference to the value at path
pub fn get_at_path_mut<'a>(root: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(obj)) => obj.get_mut(key)?,
            (PathSegment::Index(idx), Value::Array(arr)) => arr.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set value at path, creating intermediate documents as needed.
///
/// An index equal to the array length appends.
pub fn set_at_path(root: &mut Value, path: &DocPath, value: Value) -> Result<(), PathError> {
    let Some((parent, last)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for (i, segment) in parent.iter().enumerate() {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(obj)) => {
                obj.entry(key.clone()).or_insert_with(|| match &path.segments[i + 1] {
                    PathSegment::Key(_) => Value::document(),
                    PathSegment::Index(_) => Value::Array(Vec::new()),
                })
            }
            (PathSegment::Index(idx), Value::Array(arr)) => {
                let len = arr.len();
                arr.get_mut(*idx).ok_or_else(|| PathError::IndexOutOfBounds {
                    path: path.to_string(),
                    index: *idx,
                    len,
                })?
            }
            (segment, other) => return Err(mismatch(path, segment, other)),
        };
    }

    match (last, current) {
        (PathSegment::Key(key), Value::Object(obj)) => {
            obj.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(idx), Value::Array(arr)) => {
            if *idx < arr.len() {
                arr[*idx] = value;
                Ok(())
            } else if *idx == arr.len() {
                arr.push(value);
                Ok(())
            } else {
                Err(PathError::IndexOutOfBounds {
                    path: path.to_string(),
                    index: *idx,
                    len: arr.len(),
                })
            }
        }
        (segment, other) => Err(mismatch(path, segment, other)),
    }
}

/// Remove the value at path. Missing paths are not an error.
pub fn remove_at_path(root: &mut Value, path: &DocPath) -> Option<Value> {
    let (parent, last) = path.split_last()?;
    match (last, get_at_path_mut(root, parent)?) {
        (PathSegment::Key(key), Value::Object(obj)) => obj.remove(key),
        (PathSegment::Index(idx), Value::Array(arr)) if *idx < arr.len() => Some(arr.remove(*idx)),
        _ => None,
    }
}

/// Insert into the array holding the element addressed by `path`.
///
/// Indexes past the end append.
pub fn insert_at_path(root: &mut Value, path: &DocPath, value: Value) -> Result<(), PathError> {
    let (parent, last) = path
        .split_last()
        .ok_or_else(|| PathError::NotFound(path.to_string()))?;
    let PathSegment::Index(idx) = last else {
        return Err(PathError::TypeMismatch {
            path: path.to_string(),
            expected: "array element",
            found: "field",
        });
    };
    match get_at_path_mut(root, parent) {
        Some(Value::Array(arr)) => {
            let at = (*idx).min(arr.len());
            arr.insert(at, value);
            Ok(())
        }
        Some(other) => Err(PathError::TypeMismatch {
            path: path.to_string(),
            expected: "array",
            found: type_label(other),
        }),
        None => Err(PathError::NotFound(path.to_string())),
    }
}

/// Append to the array at `path`.
///
/// A scalar at `path` is wrapped into an array first. Returns `false` when
/// nothing exists at `path`.
pub fn append_at_path(root: &mut Value, path: &DocPath, value: Value) -> bool {
    match get_at_path_mut(root, path.segments()) {
        Some(Value::Array(arr)) => {
            arr.push(value);
            true
        }
        Some(existing) => {
            let old = std::mem::take(existing);
            *existing = Value::Array(vec![old, value]);
            true
        }
        None => false,
    }
}

/// Merge the fields of `patch` into `target`.
///
/// Nested documents merge recursively; a `Null` field removes the key.
pub fn merge_documents(target: &mut Value, patch: &Value) {
    let Value::Object(patch_obj) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::document();
    }
    let Some(target_obj) = target.as_object_mut() else {
        return;
    };
    for (key, value) in patch_obj {
        if value.is_null() {
            target_obj.remove(key);
        } else if let Some(existing) = target_obj.get_mut(key) {
            if existing.is_object() && value.is_object() {
                merge_documents(existing, value);
            } else {
                *existing = value.clone();
            }
        } else {
            target_obj.insert(key.clone(), value.clone());
        }
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "document",
        Value::Array(_) => "array",
        Value::Null => "null",
        _ => "scalar",
    }
}

fn mismatch(path: &DocPath, segment: &PathSegment, found: &Value) -> PathError {
    PathError::TypeMismatch {
        path: path.to_string(),
        expected: match segment {
            PathSegment::Key(_) => "document",
            PathSegment::Index(_) => "array",
        },
        found: type_label(found),
    }
}
