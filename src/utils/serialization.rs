// src/utils/serialization.rs
//! JSON helpers shared by the fetcher and the pipeline logs.

use serde::{de::DeserializeOwned, Serialize};

/// Deserializes a value from raw JSON bytes.
///
/// # Arguments
/// * `data` - JSON document as received over the wire
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if the bytes are not valid JSON for `T`
pub fn deserialize_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Renders a value as indented JSON for log output.
///
/// Falls back to the serializer error text.
pub fn to_pretty_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
