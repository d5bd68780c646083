use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Generate a fresh Curve25519 keypair from the OS RNG.
/// Returns (secret bytes, public bytes). The secret is zeroized on drop.
pub fn generate_curve25519_keypair() -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (Zeroizing::new(secret.to_bytes()), public.to_bytes())
}

/// Curve25519 ECDH: derive the shared secret from our secret key and the
/// peer's public key. Symmetric: derive(a, B) == derive(b, A).
pub fn derive_shared_secret(secret: &[u8; 32], peer_public: &[u8; 32]) -> Zeroizing<[u8; 32]> {
    let secret = StaticSecret::from(*secret);
    let public = PublicKey::from(*peer_public);
    Zeroizing::new(secret.diffie_hellman(&public).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdh_agreement() {
        let (a_secret, a_public) = generate_curve25519_keypair();
        let (b_secret, b_public) = generate_curve25519_keypair();
        let ab = derive_shared_secret(&a_secret, &b_public);
        let ba = derive_shared_secret(&b_secret, &a_public);
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn distinct_peers_distinct_secrets() {
        let (a_secret, _) = generate_curve25519_keypair();
        let (_, b_public) = generate_curve25519_keypair();
        let (_, c_public) = generate_curve25519_keypair();
        let ab = derive_shared_secret(&a_secret, &b_public);
        let ac = derive_shared_secret(&a_secret, &c_public);
        assert_ne!(*ab, *ac);
    }
}
