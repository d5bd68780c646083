use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use web4_core::types::{PublicKey32, Signature64};

use crate::error::CryptoError;

/// Generate a fresh Ed25519 keypair from the OS RNG.
/// Returns (secret bytes, public key). The secret is zeroized on drop.
pub fn generate_ed25519_keypair() -> (Zeroizing<[u8; 32]>, PublicKey32) {
    let signing = SigningKey::generate(&mut OsRng);
    let public = PublicKey32(signing.verifying_key().to_bytes());
    (Zeroizing::new(signing.to_bytes()), public)
}

/// Sign `message` with an Ed25519 secret key.
pub fn sign(secret: &[u8; 32], message: &[u8]) -> Signature64 {
    let signing = SigningKey::from_bytes(secret);
    Signature64(signing.sign(message).to_bytes())
}

/// Verify a detached Ed25519 signature.
pub fn verify(
    public_key: &PublicKey32,
    message: &[u8],
    signature: &Signature64,
) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(public_key.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
    let sig = Signature::from_bytes(signature.as_bytes());
    key.verify(message, &sig).map_err(|_| CryptoError::AuthFailed)
}

/// Stateless signer used by transaction builders and the node key file.
pub struct Ed25519Signer {
    pub public_key: PublicKey32,
    secret: Zeroizing<[u8; 32]>,
}

impl Ed25519Signer {
    pub fn generate() -> Self {
        let (secret, public_key) = generate_ed25519_keypair();
        Self { public_key, secret }
    }

    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&secret);
        Self {
            public_key: PublicKey32(signing.verifying_key().to_bytes()),
            secret: Zeroizing::new(secret),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature64 {
        sign(&self.secret, message)
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signer {{ public_key: {:?} }}", self.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let signer = Ed25519Signer::generate();
        let message = b"cryptographically bound relationships";
        let sig = signer.sign(message);
        assert!(verify(&signer.public_key, message, &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let signer = Ed25519Signer::generate();
        let sig = signer.sign(b"original");
        assert!(matches!(
            verify(&signer.public_key, b"tampered", &sig),
            Err(CryptoError::AuthFailed)
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let a = Ed25519Signer::generate();
        let b = Ed25519Signer::generate();
        let sig = a.sign(b"message");
        assert!(verify(&b.public_key, b"message", &sig).is_err());
    }
}
