//! Property value types for graph vertices and edges

use super::types::PropertyId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Property value supporting multiple data types.
///
/// Scan comparisons are defined only between values of the same variant;
/// values of different variants are never considered comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Null => "Null",
        }
    }

    /// Compare with another value of the same variant. Returns `None` for
    /// mismatched variants and for NaN floats.
    pub fn try_compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::String(a), PropertyValue::String(b)) => Some(a.cmp(b)),
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => Some(a.cmp(b)),
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.partial_cmp(b),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => Some(a.cmp(b)),
            (PropertyValue::Null, PropertyValue::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// Ordered set of `(property id, value)` pairs with unique ids.
///
/// Mutation is copy-on-write: updates build a replacement array and swap it
/// in, matching the element gate's read-mostly access pattern.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    entries: Vec<(PropertyId, PropertyValue)>,
}

impl PropertySet {
    pub fn new() -> Self {
        PropertySet {
            entries: Vec::new(),
        }
    }

    /// Build from pairs; a later pair with a duplicate id replaces the
    /// earlier one so the uniqueness invariant holds from the start.
    pub fn from_entries(entries: Vec<(PropertyId, PropertyValue)>) -> Self {
        let mut set = PropertySet::new();
        for (id, value) in entries {
            set.upsert(id, value);
        }
        set
    }

    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, v)| v)
    }

    /// Insert or replace. Returns `true` when an existing entry was
    /// replaced, `false` when a new one was appended.
    pub fn upsert(&mut self, id: PropertyId, value: PropertyValue) -> bool {
        let mut next = Vec::with_capacity(self.entries.len() + 1);
        let mut replaced = false;
        for (pid, existing) in self.entries.drain(..) {
            if pid == id {
                next.push((pid, value.clone()));
                replaced = true;
            } else {
                next.push((pid, existing));
            }
        }
        if !replaced {
            next.push((id, value));
        }
        self.entries = next;
        replaced
    }

    /// Remove the entry for `id`. Returns `true` when something was removed.
    pub fn remove(&mut self, id: PropertyId) -> bool {
        let before = self.entries.len();
        let next: Vec<_> = self
            .entries
            .drain(..)
            .filter(|(pid, _)| *pid != id)
            .collect();
        self.entries = next;
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(PropertyId, PropertyValue)] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<(PropertyId, PropertyValue)> {
        self.entries.clone()
    }

    /// Release excess capacity.
    pub fn compact(&mut self) {
        self.entries.shrink_to_fit();
    }
}
