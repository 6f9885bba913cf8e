//! Text-level entry points: [`dumpjs`] and [`loadjs`].

use std::fmt;

use mixforge_core::{Heap, TypeRegistry, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::deserialize;
use crate::encode::serialize;
use crate::error::Result;

/// JSON text produced by [`dumpjs`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSerializedObject(String);

impl JsonSerializedObject {
    /// Wrap JSON text without checking it.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the JSON text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JsonSerializedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JsonSerializedObject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for JsonSerializedObject {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Rendering options for [`dumpjs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Indent nested structures
    pub pretty: bool,
}

impl DumpOptions {
    /// Compact output
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Indented output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

/// Serialize a value to JSON text.
pub fn dumpjs(heap: &Heap, value: &Value, options: DumpOptions) -> Result<JsonSerializedObject> {
    let tree = serialize(heap, value)?;
    let text = if options.pretty {
        serde_json::to_string_pretty(&tree)?
    } else {
        serde_json::to_string(&tree)?
    };
    debug!(bytes = text.len(), "dumped object graph");
    Ok(JsonSerializedObject(text))
}

/// Rebuild a value from JSON text produced by [`dumpjs`].
pub fn loadjs(heap: &mut Heap, registry: &TypeRegistry, text: &str) -> Result<Value> {
    let tree: serde_json::Value = serde_json::from_str(text)?;
    let before = heap.len();
    let value = deserialize(heap, registry, &tree)?;
    debug!(nodes = heap.len() - before, "loaded object graph");
    Ok(value)
}
