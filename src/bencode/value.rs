use bytes::Bytes;
use std::collections::BTreeMap;

/// A bencode value: integer, byte string, list, or dictionary.
///
/// The builder only ever constructs values and serializes them, so the
/// surface here stays minimal: the variants, a text constructor, and a
/// dictionary lookup. Inspection beyond that is pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string, not necessarily valid UTF-8.
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary; `BTreeMap` keeps keys in the sorted order the
    /// encoding emits them in.
    Dict(BTreeMap<Bytes, Value>),
}

impl Value {
    /// A byte string carrying UTF-8 text. The byte length, not the
    /// character count, becomes the encoded length prefix.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Looks up a dictionary entry. `None` for non-dictionaries and
    /// missing keys.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        match self {
            Value::Dict(dict) => dict.get(key),
            _ => None,
        }
    }
}
