//! Pure-function cryptographic façade for the Web4 ledger.
//!
//! Keepers never instantiate RNGs or ciphers directly; everything routes
//! through this crate. Secret temporaries are `Zeroizing` so every success
//! and error path wipes them.

pub mod aead;
pub mod ecdh;
pub mod error;
pub mod hash;
pub mod pow;
pub mod sign;
pub mod splitkey;

pub use aead::{decrypt_with_key, encrypt_with_key};
pub use ecdh::{derive_shared_secret, generate_curve25519_keypair};
pub use error::CryptoError;
pub use hash::{anonymize, sha256, sha256_concat, sha256_hash, tx_id_from_body};
pub use pow::hash_meets_difficulty;
pub use sign::{generate_ed25519_keypair, sign, verify, Ed25519Signer};
pub use splitkey::{combine_key_shares, compare_response, generate_key_share, wipe};
