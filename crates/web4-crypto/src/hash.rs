use sha2::{Digest, Sha256};
use web4_core::types::{Hash32, TxId};

/// Compute SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 over the concatenation of several byte slices.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 as a [`Hash32`].
pub fn sha256_hash(data: &[u8]) -> Hash32 {
    Hash32::from_bytes(sha256(data))
}

/// Anonymous identifier derivation: SHA-256 of a raw identifier string.
/// The raw value never reaches storage; only this digest does.
pub fn anonymize(raw: &str) -> Hash32 {
    sha256_hash(raw.as_bytes())
}

/// Derive a TxId from canonical transaction body bytes.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    sha256_hash(body_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("batt-001"), a literal anonymous registration id.
        assert_eq!(
            anonymize("batt-001").to_hex(),
            hex::encode(sha256(b"batt-001"))
        );
        assert_eq!(anonymize("batt-001").to_hex().len(), 64);
    }

    #[test]
    fn concat_matches_single_update() {
        assert_eq!(sha256_concat(&[b"ab", b"cd"]), sha256(b"abcd"));
    }
}
