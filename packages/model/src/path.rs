//! # Path Mutator
//!
//! Copy-on-write edits over nested JSON records addressed by dotted paths.
//!
//! A path is a dot-separated list of segments. Inside an object a segment is a key,
//! inside an array it must parse as an index that already exists:
//!
//! ```text
//! "items.0.title"   →   root["items"][0]["title"]
//! ```
//!
//! Missing intermediate containers (and scalars in the way) become empty objects.
//! Arrays never grow implicitly; the caller is responsible for list length.
//!
//! Every function takes the root by reference and returns a fresh value, so the
//! input is never mutated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Empty path")]
    EmptyPath,

    #[error("Empty segment in path '{0}'")]
    EmptySegment(String),

    #[error("Segment '{segment}' is not an array index")]
    NotAnIndex { segment: String },

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Value at '{0}' is not a list")]
    NotAList(String),

    #[error("Field '{0}' cannot be written by path")]
    Reserved(String),

    #[error("Record shape error: {0}")]
    Shape(String),
}

impl From<serde_json::Error> for PathError {
    fn from(e: serde_json::Error) -> Self {
        PathError::Shape(e.to_string())
    }
}

/// Direction for [`move_list_item`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMove {
    Up,
    Down,
}

pub(crate) fn segments(path: &str) -> Result<Vec<&str>, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::EmptySegment(path.to_string()));
    }

    Ok(segments)
}

/// Walk to the slot addressed by `segments`, creating empty objects on the way
fn slot_mut<'a>(target: &'a mut Value, segments: &[&str]) -> Result<&'a mut Value, PathError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(target);
    };

    if !matches!(target, Value::Object(_) | Value::Array(_)) {
        *target = Value::Object(Map::new());
    }

    let slot = match target {
        Value::Array(items) => {
            let index: usize = head.parse().map_err(|_| PathError::NotAnIndex {
                segment: head.to_string(),
            })?;
            let len = items.len();
            items
                .get_mut(index)
                .ok_or(PathError::IndexOutOfBounds { index, len })?
        }
        Value::Object(map) => map.entry(head.to_string()).or_insert(Value::Null),
        _ => return Err(PathError::Shape(format!("cannot descend into '{head}'"))),
    };

    slot_mut(slot, rest)
}

/// Return a copy of `root` with the value at `path` replaced by `value`
pub fn set_by_path(root: &Value, path: &str, value: Value) -> Result<Value, PathError> {
    let segments = segments(path)?;
    let mut next = root.clone();
    *slot_mut(&mut next, &segments)? = value;
    Ok(next)
}

/// Read the value at `path`, if every segment resolves
pub fn get_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = segments(path).ok()?;

    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn list_mut<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Vec<Value>, PathError> {
    let segments = segments(path)?;
    let slot = slot_mut(root, &segments)?;

    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }

    slot.as_array_mut()
        .ok_or_else(|| PathError::NotAList(path.to_string()))
}

/// Append `item` to the list at `path` (a missing list is created)
pub fn insert_list_item(root: &Value, path: &str, item: Value) -> Result<Value, PathError> {
    let mut next = root.clone();
    list_mut(&mut next, path)?.push(item);
    Ok(next)
}

/// Remove the entry at `index` from the list at `path`
pub fn remove_list_item(root: &Value, path: &str, index: usize) -> Result<Value, PathError> {
    let mut next = root.clone();
    let items = list_mut(&mut next, path)?;

    if index >= items.len() {
        return Err(PathError::IndexOutOfBounds {
            index,
            len: items.len(),
        });
    }

    items.remove(index);
    Ok(next)
}

/// Swap the entry at `index` with its neighbour. Moving past either end is a no-op.
pub fn move_list_item(
    root: &Value,
    path: &str,
    index: usize,
    direction: ListMove,
) -> Result<Value, PathError> {
    let mut next = root.clone();
    let items = list_mut(&mut next, path)?;

    if index >= items.len() {
        return Err(PathError::IndexOutOfBounds {
            index,
            len: items.len(),
        });
    }

    let target = match direction {
        ListMove::Up => index.checked_sub(1),
        ListMove::Down => Some(index + 1).filter(|t| *t < items.len()),
    };

    if let Some(target) = target {
        items.swap(index, target);
    }

    Ok(next)
}
