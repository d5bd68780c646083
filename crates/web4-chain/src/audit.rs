//! Storage-wide audits backing the cryptographic hygiene guarantees:
//! no key material on chain, and every identifier hash at full width.

use web4_core::error::LedgerError;
use web4_lct::LinkedContextToken;
use web4_registry::Component;
use web4_store::{keys, Store};

/// Scan every stored value for a known secret, both raw and hex-encoded.
/// Returns the offending keys; empty means the store is clean.
pub fn find_key_material(store: &Store, secret: &[u8]) -> Result<Vec<Vec<u8>>, LedgerError> {
    let hex_form = hex::encode(secret).into_bytes();
    let mut hits = Vec::new();
    for prefix in keys::ALL_PREFIXES {
        for (key, value) in store.scan_prefix(prefix.as_bytes())? {
            if contains(&value, secret) || contains(&value, &hex_form) {
                hits.push(key);
            }
        }
    }
    Ok(hits)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Check that every identifier-hash field in components and LCTs is a full
/// 32-byte digest and every hash-keyed storage key carries 64 hex chars.
pub fn audit_hash_widths(store: &Store) -> Result<bool, LedgerError> {
    for (key, component) in store.scan_prefix_as::<Component>(keys::COMPONENT.as_bytes())? {
        if !key_suffix_is_hex64(&key, keys::COMPONENT) {
            return Ok(false);
        }
        // Hash32 fields are 32 bytes by construction; reject placeholder
        // zero digests, which would mean a hash was never derived.
        if component.component_id.is_zero()
            || component.manufacturer_hash.is_zero()
            || component.category_hash.is_zero()
            || component.authorization_rules_hash.is_zero()
        {
            return Ok(false);
        }
    }
    for (key, lct) in store.scan_prefix_as::<LinkedContextToken>(keys::LCT.as_bytes())? {
        if !key_suffix_is_hex64(&key, keys::LCT) {
            return Ok(false);
        }
        if lct.key_reference.is_zero() || lct.lct_id.is_zero() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn key_suffix_is_hex64(key: &[u8], prefix: &str) -> bool {
    let suffix = &key[prefix.len()..];
    suffix.len() == 64
        && suffix
            .iter()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
}

/// Convenience wrapper: true when none of the provided secrets appear
/// anywhere in storage.
pub fn audit_no_key_material(store: &Store, secrets: &[Vec<u8>]) -> Result<bool, LedgerError> {
    for secret in secrets {
        if !find_key_material(store, secret)?.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Every stored key reference, as full-width digests (query surface for
/// external audits).
pub fn stored_key_reference_widths(store: &Store) -> Result<Vec<usize>, LedgerError> {
    Ok(store
        .scan_prefix_as::<LinkedContextToken>(keys::LCT.as_bytes())?
        .into_iter()
        .map(|(_, lct)| lct.key_reference.as_bytes().len())
        .collect())
}
