//! # Hashing Utilities
//!
//! BLAKE3 is the only hash function Pledge uses: call ids and custody
//! derivation both go through here.

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Domain-separated hash: `BLAKE3-derive_key(context, data)`.
///
/// Two different contexts never produce related outputs for the same data,
/// which keeps signing payloads from one purpose out of another.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"pledge"), blake3_hash(b"pledge"));
        assert_ne!(blake3_hash(b"pledge"), blake3_hash(b"pledgf"));
    }

    #[test]
    fn domain_separation_changes_output() {
        assert_ne!(
            domain_separated_hash("ctx-a", b"x"),
            domain_separated_hash("ctx-b", b"x")
        );
    }
}
