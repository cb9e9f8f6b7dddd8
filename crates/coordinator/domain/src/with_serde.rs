//! Hand-written serde adapters for fields without a native serde form.

/// Serializes byte blobs as lowercase hex strings.
///
/// Raw signature material and serialized envelopes travel through JSON-shaped
/// layers, where a hex string survives copy/paste and logging better than an
/// integer array.
pub mod hex_bytes {
    use alloc::{string::String, vec::Vec};

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)
            .map(|encoded| hex::decode(encoded))?
            .map_err(D::Error::custom)
    }
}
