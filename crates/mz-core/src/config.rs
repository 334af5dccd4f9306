//! The typed configuration `Value` model consumed by the core.
//!
//! This is the closed, tagged value type produced by an external
//! configuration loader (the `type identifier = value;` grammar is an
//! out-of-scope collaborator) and handed to the core as character/power-up
//! configuration. Live vs. default configs are independent deep copies of
//! a [`Dict`]; overlaying and restoring keys dispatches on the tag.

use hashbrown::HashMap;

use crate::error::ValueError;
use crate::geometry::{Rect, Size};

/// An ordered dictionary of named `Value`s, in insertion order of first
/// write (new keys are appended; re-inserting an existing key keeps its
/// original position).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    order: Vec<String>,
    entries: HashMap<String, Value>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Write `value` at `key`, replacing whatever tag was there before
    /// (per the spec's "write through... regardless of the live slot's
    /// previous tag" resolution). Appends `key` to insertion order if new.
    pub fn set(&mut self, key: &str, value: Value) {
        if !self.entries.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.entries.insert(key.to_string(), value);
    }

    /// Remove `key` entirely, if present.
    pub fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order.iter().map(move |k| (k.as_str(), &self.entries[k]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|v| v.as_int().ok()).unwrap_or(default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get(key).and_then(|v| v.as_float().ok()).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool().ok()).unwrap_or(default)
    }

    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(|v| v.as_str().ok()).unwrap_or(default)
    }

    pub fn get_size(&self, key: &str, default: Size) -> Size {
        self.get(key).and_then(|v| v.as_size().ok()).unwrap_or(default)
    }
}

/// A closed, tagged configuration value: int, float, string, size,
/// rectangle, an ordered list of same-typed values, or a nested
/// dictionary. Produced by an external loader, never parsed by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Str(String),
    Size(Size),
    Rect(Rect),
    /// A list of values, all of the same variant (not enforced by the
    /// type itself, matching the source grammar's `list[element-type]`).
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Size(_) => "size",
            Value::Rect(_) => "rectangle",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(ValueError::TypeMismatch {
                expected: "int",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_float(&self) -> Result<f32, ValueError> {
        match self {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f32),
            other => Err(ValueError::TypeMismatch {
                expected: "float",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Int(v) => Ok(*v != 0),
            other => Err(ValueError::TypeMismatch {
                expected: "bool (int)",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::Str(v) => Ok(v.as_str()),
            other => Err(ValueError::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_size(&self) -> Result<Size, ValueError> {
        match self {
            Value::Size(v) => Ok(*v),
            other => Err(ValueError::TypeMismatch {
                expected: "size",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_rect(&self) -> Result<Rect, ValueError> {
        match self {
            Value::Rect(v) => Ok(*v),
            other => Err(ValueError::TypeMismatch {
                expected: "rectangle",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Value::List(v) => Ok(v.as_slice()),
            other => Err(ValueError::TypeMismatch {
                expected: "list",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dict, ValueError> {
        match self {
            Value::Dict(v) => Ok(v),
            other => Err(ValueError::TypeMismatch {
                expected: "dictionary",
                found: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_through_replaces_tag_regardless_of_previous() {
        let mut dict = Dict::new();
        dict.set("speed", Value::Float(3.5));
        dict.set("speed", Value::Int(7)); // power-up overrides with a mismatched tag
        assert_eq!(dict.get("speed").unwrap().as_int().unwrap(), 7);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut dict = Dict::new();
        dict.set("b", Value::Int(2));
        dict.set("a", Value::Int(1));
        dict.set("b", Value::Int(20));
        let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn type_mismatch_reports_both_tags() {
        let v = Value::Str("hi".into());
        let err = v.as_int().unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: "int",
                found: "string"
            }
        );
    }

    #[test]
    fn defaults_used_when_key_absent() {
        let dict = Dict::new();
        assert_eq!(dict.get_float("speed", 3.5), 3.5);
        assert_eq!(dict.get_bool("breaks_walls", false), false);
    }
}
