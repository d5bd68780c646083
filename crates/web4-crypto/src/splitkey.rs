use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;

/// Generate one 32-byte split-key share from the OS RNG.
/// Fails only if the OS RNG is exhausted or unavailable.
pub fn generate_key_share() -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let mut share = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut share)
        .map_err(|_| CryptoError::Rng)?;
    Ok(Zeroizing::new(share))
}

/// Combine two shares and an ECDH shared secret into the full key:
/// SHA-256(a ‖ b ‖ shared). This is the authoritative combination; no XOR
/// path exists.
pub fn combine_key_shares(
    a: &[u8; 32],
    b: &[u8; 32],
    shared: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.update(shared);
    Zeroizing::new(hasher.finalize().into())
}

/// Constant-time equality for challenge responses. Comparison time is
/// independent of the position of the first differing byte; a length
/// mismatch short-circuits (lengths are public).
pub fn compare_response(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Overwrite a secret buffer with zeros. Compiles to a volatile write that
/// the optimizer may not elide.
pub fn wipe(buf: &mut [u8]) {
    buf.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_are_random() {
        let a = generate_key_share().unwrap();
        let b = generate_key_share().unwrap();
        assert_ne!(*a, *b);
        assert_ne!(*a, [0u8; 32]);
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let shared = [3u8; 32];
        assert_ne!(
            *combine_key_shares(&a, &b, &shared),
            *combine_key_shares(&b, &a, &shared)
        );
    }

    #[test]
    fn combine_matches_manual_hash() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let shared = [3u8; 32];
        let mut concat = Vec::new();
        concat.extend_from_slice(&a);
        concat.extend_from_slice(&b);
        concat.extend_from_slice(&shared);
        assert_eq!(*combine_key_shares(&a, &b, &shared), crate::hash::sha256(&concat));
    }

    #[test]
    fn compare_response_semantics() {
        assert!(compare_response(b"abc", b"abc"));
        assert!(!compare_response(b"abc", b"abd"));
        assert!(!compare_response(b"abc", b"ab"));
        assert!(compare_response(b"", b""));
    }

    #[test]
    fn wipe_zeroes_buffer() {
        let mut buf = [0xffu8; 32];
        wipe(&mut buf);
        assert_eq!(buf, [0u8; 32]);
    }
}
