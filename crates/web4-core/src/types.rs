use serde::de::{Error as _, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Visitor for fixed-width byte fields. Accepts byte strings (CBOR) and
/// u8 sequences (bincode) so the same derive-free impls work for both the
/// storage codec and the payload codec.
struct FixedBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{N} bytes")
    }

    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        if v.len() != N {
            return Err(E::invalid_length(v.len(), &self));
        }
        let mut arr = [0u8; N];
        arr.copy_from_slice(v);
        Ok(arr)
    }

    fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut arr = [0u8; N];
        for (i, slot) in arr.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(serde::de::Error::invalid_length(N + 1, &self));
        }
        Ok(arr)
    }
}

/// Nanosecond wall-clock instant (UTC). Provided once per block by the
/// block worker; keepers never read the clock themselves.
pub type TimestampNs = u64;

/// Trust score or energy amount. Always kept in a finite, validated range
/// by the keeper that writes it.
pub type Score = f64;

// ── Hash32 ───────────────────────────────────────────────────────────────────

/// 32-byte SHA-256 digest. The only identifier form that ever reaches
/// storage: component ids, LCT ids, key references, tensor ids, block
/// hashes are all `Hash32` values, rendered as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({}…)", &self.to_hex()[..16])
    }
}

// Hex string in human-readable formats (JSON), raw bytes in bincode.
impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Hash32::from_hex(&s).map_err(|_| D::Error::custom("expected 64 hex chars"))
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<32>)
                .map(Hash32)
        }
    }
}

// ── Identifier aliases ───────────────────────────────────────────────────────

/// Anonymous component identifier: SHA-256 of the real component id.
pub type ComponentId = Hash32;

/// Linked Context Token identifier: SHA-256 of (componentA ‖ componentB ‖ created_at).
pub type LctId = Hash32;

/// Transaction identifier: SHA-256 of the canonical transaction body bytes.
pub type TxId = Hash32;

/// Split-key pairing session identifier.
pub type PairingId = Hash32;

/// Pairing challenge identifier.
pub type ChallengeId = Hash32;

/// Trust tensor identifier.
pub type TensorId = Hash32;

/// Energy operation identifier.
pub type OperationId = Hash32;

/// Queued pairing request identifier.
pub type RequestId = Hash32;

// ── Signature64 ──────────────────────────────────────────────────────────────

/// Detached Ed25519 signature (64 bytes). The all-zero value marks the one
/// system transaction a sealed block may carry (the mining reward).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature64(pub [u8; 64]);

impl Signature64 {
    pub const ZERO: Signature64 = Signature64([0u8; 64]);

    pub fn from_bytes(b: [u8; 64]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Default for Signature64 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Signature64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature64({}…)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Signature64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Signature64::from_hex(&s).map_err(|_| D::Error::custom("expected 128 hex chars"))
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<64>)
                .map(Signature64)
        }
    }
}

// ── PublicKey32 ──────────────────────────────────────────────────────────────

/// Ed25519 public key carried on a transaction for signature verification.
/// Binding a key to a component hash is the trust anchor's concern; the
/// ledger only checks that the signature matches this key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey32(pub [u8; 32]);

impl PublicKey32 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Hash32::from_hex(s).map(|h| Self(h.0))
    }
}

impl fmt::Debug for PublicKey32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey32({}…)", &self.to_hex()[..16])
    }
}

impl Serialize for PublicKey32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PublicKey32::from_hex(&s).map_err(|_| D::Error::custom("expected 64 hex chars"))
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<32>)
                .map(PublicKey32)
        }
    }
}
