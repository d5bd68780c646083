use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

/// ChaCha20-Poly1305 nonce width.
const NONCE_LEN: usize = 12;

/// AEAD-encrypt `plaintext` under `key` with a fresh random nonce.
/// Output framing: nonce ‖ ciphertext (tag appended by the AEAD).
pub fn encrypt_with_key(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| CryptoError::Rng)?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::InvalidKey)?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a nonce‖ciphertext frame. Truncation or tag mismatch both fail
/// with `AuthFailed`.
pub fn decrypt_with_key(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_LEN {
        return Err(CryptoError::AuthFailed);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::AuthFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = [0x11u8; 32];
        let plaintext = b"split-key half exchange";
        let sealed = encrypt_with_key(&key, plaintext).unwrap();
        assert_eq!(decrypt_with_key(&key, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn wrong_key_fails_auth() {
        let sealed = encrypt_with_key(&[0x11u8; 32], b"secret").unwrap();
        assert!(matches!(
            decrypt_with_key(&[0x22u8; 32], &sealed),
            Err(CryptoError::AuthFailed)
        ));
    }

    #[test]
    fn truncated_frame_fails_auth() {
        let sealed = encrypt_with_key(&[0x11u8; 32], b"secret").unwrap();
        assert!(matches!(
            decrypt_with_key(&[0x11u8; 32], &sealed[..8]),
            Err(CryptoError::AuthFailed)
        ));
        assert!(matches!(
            decrypt_with_key(&[0x11u8; 32], &sealed[..sealed.len() - 1]),
            Err(CryptoError::AuthFailed)
        ));
    }

    #[test]
    fn fresh_nonce_per_call() {
        let key = [0x11u8; 32];
        let a = encrypt_with_key(&key, b"same").unwrap();
        let b = encrypt_with_key(&key, b"same").unwrap();
        assert_ne!(a, b);
    }
}
