//! Bencode encoders.
//!
//! Responses are small and have a fixed shape, so they are written directly
//! with these two functions instead of going through a serializer. Both are
//! binary safe.

/// Encodes an integer: `i<n>e`.
#[must_use]
pub fn int(value: i64) -> Vec<u8> {
    format!("i{value}e").into_bytes()
}

/// Encodes a byte string: `<len>:<bytes>`.
#[must_use]
pub fn str(value: &[u8]) -> Vec<u8> {
    let mut encoded = format!("{}:", value.len()).into_bytes();
    encoded.extend_from_slice(value);
    encoded
}
