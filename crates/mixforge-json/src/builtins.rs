//! Wire encoding of builtin leaf values JSON has no native form for.
//!
//! Bytes, dates, timestamps, UUIDs and paths are written as ordinary
//! `(MODULE, CLASS, STATE)` records under [`BUILTINS_MODULE`], with a string
//! state: base64 for bytes, ISO-8601 for dates and timestamps, the hyphenated
//! form for UUIDs, and the path text.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use mixforge_core::Value;
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::error::{CodecError, Result};
use crate::markers;

/// Module tag of builtin leaf records.
pub const BUILTINS_MODULE: &str = "mixforge.builtins";

const BYTES: &str = "bytes";
const DATE: &str = "date";
const DATETIME: &str = "datetime";
const UUID: &str = "uuid";
const PATH: &str = "path";

/// Record for a builtin leaf value, or `None` if the value is not one.
pub(crate) fn encode(value: &Value) -> Option<Json> {
    let (class, state) = match value {
        Value::Bytes(bytes) => (BYTES, STANDARD.encode(bytes)),
        Value::Date(date) => (DATE, date.format("%Y-%m-%d").to_string()),
        Value::DateTime(ts) => (DATETIME, ts.to_rfc3339()),
        Value::Uuid(id) => (UUID, id.hyphenated().to_string()),
        Value::Path(path) => (PATH, path.to_string_lossy().into_owned()),
        _ => return None,
    };
    let mut record = Map::new();
    record.insert(markers::CLASS.to_string(), Json::from(class));
    record.insert(markers::MODULE.to_string(), Json::from(BUILTINS_MODULE));
    record.insert(markers::STATE.to_string(), Json::from(state));
    Some(Json::Object(record))
}

/// Rebuild a builtin leaf value from its class name and state.
pub(crate) fn decode(class: &str, state: &Json) -> Result<Value> {
    let text = state.as_str().ok_or_else(|| {
        CodecError::malformed(format!("state of builtin {class} must be a string"))
    })?;
    let invalid = |e: &dyn std::fmt::Display| {
        CodecError::malformed(format!("invalid {class} state '{text}': {e}"))
    };
    match class {
        BYTES => STANDARD
            .decode(text)
            .map(Value::Bytes)
            .map_err(|e| invalid(&e)),
        DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| invalid(&e)),
        DATETIME => DateTime::parse_from_rfc3339(text)
            .map(|ts| Value::DateTime(ts.with_timezone(&Utc)))
            .map_err(|e| invalid(&e)),
        UUID => Uuid::parse_str(text).map(Value::Uuid).map_err(|e| invalid(&e)),
        PATH => Ok(Value::Path(PathBuf::from(text))),
        other => Err(CodecError::UnknownType(mixforge_core::TypeKey::new(
            BUILTINS_MODULE,
            other,
        ))),
    }
}
