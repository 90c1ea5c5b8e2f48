//! YAML codec
//!
//! Documents decode to an insertion-ordered mapping so that a read-back
//! preserves the key order of the source document. Encoding always emits
//! block style with fixed indentation; inline flow collections are never
//! produced.

use serde::Serialize;
use serde_yaml::Mapping;

/// Decode a YAML document into an ordered mapping
pub fn decode(bytes: &[u8]) -> Result<Mapping, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}

/// Encode any serializable value as a block-style YAML document
pub fn encode<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}
