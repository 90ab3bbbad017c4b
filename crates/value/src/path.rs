//! Path-addressed reads and writes over a [`Value`] tree.
//!
//! Object nodes are addressed by key, array nodes by a segment made only of
//! ASCII digits. Writes never fail: missing or scalar intermediates become
//! empty objects, and an array addressed by a non-numeric segment becomes an
//! object keyed by its index strings. So does an array addressed by an index
//! more than [`MAX_INDEX_GAP`] slots past its end.

use crate::value::{Map, Value};
use std::sync::Arc;

/// Most `Null` slots a single write may pad an array with.
pub const MAX_INDEX_GAP: usize = 1024;

fn index_of(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn array_to_map(items: &[Value]) -> Map {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v.clone()))
        .collect()
}

impl Value {
    /// The node at `segments`, or `None` if any step does not resolve.
    pub fn get_in<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        let mut cur = self;
        for segment in segments {
            let segment = segment.as_ref();
            cur = match cur {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(index_of(segment)?)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Number of leading segments addressing the shallowest array that a
    /// write at `segments` would resize or turn into an object.
    ///
    /// `None` when the write only replaces, inserts or removes at the last
    /// step and leaves every array on the way at its current length.
    pub fn reshape_point<S: AsRef<str>>(&self, segments: &[S]) -> Option<usize> {
        let mut cur = self;
        for (depth, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            cur = match cur {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => match index_of(segment) {
                    Some(idx) if idx < items.len() => &items[idx],
                    _ => return Some(depth),
                },
                _ => return None,
            };
        }
        None
    }

    /// Whether every step of `segments` resolves.
    pub fn has_in<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.get_in(segments).is_some()
    }

    /// Copy-spine write.
    ///
    /// Returns a new root in which every container on `segments` is a fresh
    /// shallow copy while all subtrees off the path are shared with `self`.
    /// `None` removes the addressed key or array slot. An empty path replaces
    /// the root.
    pub fn with_value_at<S: AsRef<str>>(&self, segments: &[S], value: Option<Value>) -> Value {
        let mut next = self.clone();
        // `self` keeps a reference to every node on the path, so each
        // `make_mut` inside `set_in_place` copies instead of mutating.
        next.set_in_place(segments, value);
        next
    }

    /// In-place copy-on-write: nodes on the path are only copied when they
    /// are shared with another holder.
    pub fn set_in_place<S: AsRef<str>>(&mut self, segments: &[S], value: Option<Value>) {
        if value.is_none() && !self.has_in(segments) {
            return;
        }
        place(self, segments, value);
    }
}

fn place<S: AsRef<str>>(target: &mut Value, segments: &[S], value: Option<Value>) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value.unwrap_or_default();
        return;
    };
    let head = head.as_ref();

    if let (Some(idx), Value::Array(items)) = (index_of(head), &mut *target) {
        if idx <= items.len().saturating_add(MAX_INDEX_GAP) {
            place_index(Arc::make_mut(items), idx, rest, value);
            return;
        }
    }

    let mut map = match std::mem::take(target) {
        Value::Object(map) => map,
        Value::Array(items) => Arc::new(array_to_map(&items)),
        _ => Arc::default(),
    };
    place_key(Arc::make_mut(&mut map), head, rest, value);
    *target = Value::Object(map);
}

fn place_key<S: AsRef<str>>(map: &mut Map, key: &str, rest: &[S], value: Option<Value>) {
    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert(key.to_owned(), v);
            }
            None => {
                map.shift_remove(key);
            }
        }
        return;
    }
    let child = map.entry(key.to_owned()).or_default();
    place(child, rest, value);
}

fn place_index<S: AsRef<str>>(items: &mut Vec<Value>, idx: usize, rest: &[S], value: Option<Value>) {
    if rest.is_empty() {
        match value {
            Some(v) => {
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Null);
                }
                items[idx] = v;
            }
            // Only the tail slot is dropped so other indices stay stable.
            None if items.len().checked_sub(1) == Some(idx) => {
                items.pop();
            }
            None => {
                if let Some(slot) = items.get_mut(idx) {
                    *slot = Value::Null;
                }
            }
        }
        return;
    }
    if idx >= items.len() {
        items.resize(idx + 1, Value::Null);
    }
    place(&mut items[idx], rest, value);
}
