//! Hashed lookup of set elements and mapping keys.
//!
//! Inline values hash into buckets whose members are confirmed with `==`.
//! Node references, callables, type values and NaN have no hash consistent
//! with structural equality; they share one unhashed list that callers scan.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use crate::value::Value;

/// Bucket hash of a value, or `None` when it must be compared by scanning.
///
/// Equal values always hash equal: an integer and a float compare through
/// `i64 as f64`, so both hash the bits of that float.
pub(crate) fn key_hash(value: &Value) -> Option<u64> {
    let mut h = XxHash64::with_seed(0);
    match value {
        Value::None => 0u8.hash(&mut h),
        Value::Bool(b) => (1u8, b).hash(&mut h),
        Value::Int(i) => (2u8, number_bits(*i as f64)?).hash(&mut h),
        Value::Float(f) => (2u8, number_bits(*f)?).hash(&mut h),
        Value::Str(s) => (3u8, s).hash(&mut h),
        Value::Bytes(b) => (4u8, b).hash(&mut h),
        Value::Date(d) => (5u8, d).hash(&mut h),
        Value::DateTime(t) => (6u8, t).hash(&mut h),
        Value::Uuid(u) => (7u8, u).hash(&mut h),
        Value::Path(p) => (8u8, p).hash(&mut h),
        Value::Enum(m) => (9u8, m.class().key(), m.name()).hash(&mut h),
        Value::Type(_) | Value::Callable(_) | Value::Ref(_) => return None,
    }
    Some(h.finish())
}

fn number_bits(f: f64) -> Option<u64> {
    if f.is_nan() {
        None
    } else if f == 0.0 {
        Some(0.0f64.to_bits())
    } else {
        Some(f.to_bits())
    }
}

/// Positions of keys in a slice, bucketed by [`key_hash`].
#[derive(Debug, Default)]
pub(crate) struct KeyIndex {
    buckets: HashMap<u64, Vec<usize>>,
    unhashed: Vec<usize>,
}

impl KeyIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity(capacity),
            unhashed: Vec::new(),
        }
    }

    pub(crate) fn from_keys<'a>(keys: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut index = Self::default();
        for (position, key) in keys.into_iter().enumerate() {
            index.insert(key, position);
        }
        index
    }

    pub(crate) fn insert(&mut self, key: &Value, position: usize) {
        match key_hash(key) {
            Some(hash) => self.buckets.entry(hash).or_default().push(position),
            None => self.unhashed.push(position),
        }
    }

    /// Positions that may hold a key equal to `key`.
    pub(crate) fn candidates(&self, key: &Value) -> &[usize] {
        match key_hash(key) {
            Some(hash) => self.buckets.get(&hash).map_or(&[], Vec::as_slice),
            None => &self.unhashed,
        }
    }
}
