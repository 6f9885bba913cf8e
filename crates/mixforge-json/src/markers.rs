//! Reserved keys of the wire format.
//!
//! Marker keys tag JSON objects that encode something JSON has no native form
//! for. User mapping keys only ever appear inside a [`DICT`] payload, which
//! is never scanned for markers, so serializer output cannot collide with
//! them. Hand-written blobs that use these names at record level are read as
//! markers.

/// Mapping payload
pub const DICT: &str = "..dict..";
/// Tuple payload
pub const TUPLE: &str = "..tuple..";
/// Set payload
pub const SET: &str = "..set..";
/// Class name of an instance record
pub const CLASS: &str = "..class..";
/// Module name of an instance record
pub const MODULE: &str = "..module..";
/// Constructor parameters of an instance record
pub const PARAMS: &str = "..params..";
/// State of an instance record
pub const STATE: &str = "..state..";
/// Member name of an enumeration record
pub const ENUM: &str = "..enum..";

/// Keys that select how an instance record is rebuilt.
pub const PAYLOADS: [&str; 3] = [PARAMS, STATE, ENUM];

/// Every reserved key.
pub const ALL: [&str; 8] = [DICT, TUPLE, SET, CLASS, MODULE, PARAMS, STATE, ENUM];

/// Whether `key` is reserved.
pub fn is_marker(key: &str) -> bool {
    ALL.contains(&key)
}
