//! LCT lifecycle: creation, status transitions, termination, access
//! validation, and integrity checks.

use tracing::{info, warn};
use zeroize::Zeroizing;

use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::types::{ComponentId, Hash32, LctId, TimestampNs};
use web4_crypto as crypto;
use web4_store::{keys, Overlay};

use crate::records::{
    AccessDecision, AccessLevel, LinkedContextToken, PairingStatus,
};

/// Operations a mediating proxy component may perform through an LCT it
/// does not own. Everything else requires being component A or B.
const PROXY_OPERATIONS: &[&str] = &["query", "relay", "verify"];

// ── Lookup ───────────────────────────────────────────────────────────────────

pub fn get_lct(
    state: &Overlay<'_>,
    lct_id: &LctId,
) -> Result<Option<LinkedContextToken>, LedgerError> {
    state.get(&keys::lct(lct_id))
}

pub fn require_lct(
    state: &Overlay<'_>,
    lct_id: &LctId,
) -> Result<LinkedContextToken, LedgerError> {
    get_lct(state, lct_id)?.ok_or(LedgerError::LctNotFound(*lct_id))
}

// ── Creation ─────────────────────────────────────────────────────────────────

/// Result of LCT creation. The share halves exist only for hand-off to the
/// off-chain key-holder agent; they are zeroized on drop and are never
/// stored; the ledger keeps only `key_reference`.
#[derive(Debug)]
pub struct LctCreation {
    pub lct: LinkedContextToken,
    pub device_half: Zeroizing<[u8; 32]>,
    pub lct_half: Zeroizing<[u8; 32]>,
}

/// Create the relationship between two registered, active components.
pub fn create_lct_relationship(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    creator: &str,
    component_a: ComponentId,
    component_b: ComponentId,
    context: &str,
    proxy: Option<ComponentId>,
    now: TimestampNs,
) -> Result<LctCreation, LedgerError> {
    // Canonical order: componentA < componentB.
    let (a, b) = if component_a <= component_b {
        (component_a, component_b)
    } else {
        (component_b, component_a)
    };
    web4_registry::require_active(state, &a)?;
    web4_registry::require_active(state, &b)?;

    let lct_id = LctId::from_bytes(crypto::sha256_concat(&[
        b"lct:",
        a.as_bytes(),
        b.as_bytes(),
        &now.to_le_bytes(),
    ]));
    if state.has(&keys::lct(&lct_id))? {
        return Err(LedgerError::DuplicateLct(lct_id));
    }

    // Off-chain material: two fresh halves plus an ECDH-derived secret feed
    // the combined key. Only its SHA-256 reference reaches storage.
    let device_half = crypto::generate_key_share().map_err(|_| LedgerError::CryptoFailure)?;
    let lct_half = crypto::generate_key_share().map_err(|_| LedgerError::CryptoFailure)?;
    let (device_secret, _device_public) = crypto::generate_curve25519_keypair();
    let (_lct_secret, lct_public) = crypto::generate_curve25519_keypair();
    let shared = crypto::derive_shared_secret(&device_secret, &lct_public);
    let combined = crypto::combine_key_shares(&device_half, &lct_half, &shared);
    let key_reference = crypto::sha256_hash(&combined[..]);

    let lct = LinkedContextToken {
        lct_id,
        component_a_id: a,
        component_b_id: b,
        pairing_status: PairingStatus::Pending,
        operational_context: context.to_string(),
        proxy_component_id: proxy,
        trust_anchor: creator.to_string(),
        key_reference,
        created_at: now,
        updated_at: now,
        last_contact_at: None,
        terminated_at: None,
        terminated_by: None,
        termination_reason: None,
    };
    state.put(keys::lct(&lct_id), &lct)?;
    web4_registry::add_relationship(state, &a, lct_id)?;
    web4_registry::add_relationship(state, &b, lct_id)?;

    events.push(Event::LctCreated {
        lct_id,
        component_a: a,
        component_b: b,
        context: context.to_string(),
    });
    info!(lct_id = %lct_id, "LCT relationship created");
    Ok(LctCreation {
        lct,
        device_half,
        lct_half,
    })
}

// ── Status transitions ───────────────────────────────────────────────────────

fn transition_allowed(from: PairingStatus, to: PairingStatus) -> bool {
    use PairingStatus::*;
    matches!(
        (from, to),
        (Pending, Active) | (Active, Suspended) | (Suspended, Active)
    )
}

/// Apply a bounded status transition. Terminated LCTs reject everything;
/// undefined edges reject with a conflict.
pub fn update_lct_status(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    lct_id: &LctId,
    new_status: PairingStatus,
    reason: &str,
    now: TimestampNs,
) -> Result<LinkedContextToken, LedgerError> {
    let mut lct = require_lct(state, lct_id)?;
    if lct.pairing_status == PairingStatus::Terminated {
        return Err(LedgerError::LctTerminated(*lct_id));
    }
    if !transition_allowed(lct.pairing_status, new_status) {
        return Err(LedgerError::InvalidStatusTransition {
            from: lct.pairing_status.as_str().to_string(),
            to: new_status.as_str().to_string(),
        });
    }
    let old = lct.pairing_status;
    lct.pairing_status = new_status;
    lct.updated_at = now;
    state.put(keys::lct(lct_id), &lct)?;

    events.push(Event::LctStatusChanged {
        lct_id: *lct_id,
        old_status: old.as_str().to_string(),
        new_status: new_status.as_str().to_string(),
        reason: reason.to_string(),
    });
    info!(lct_id = %lct_id, from = old.as_str(), to = new_status.as_str(), "LCT status changed");
    Ok(lct)
}

/// Terminate the relationship. Terminal: no transition ever leaves this
/// state, and `last_contact_at` stops updating.
pub fn terminate_lct_relationship(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    lct_id: &LctId,
    reason: &str,
    terminated_by: &str,
    notify_offline: bool,
    now: TimestampNs,
) -> Result<LinkedContextToken, LedgerError> {
    let mut lct = require_lct(state, lct_id)?;
    if lct.pairing_status == PairingStatus::Terminated {
        return Err(LedgerError::LctTerminated(*lct_id));
    }
    let old = lct.pairing_status;
    lct.pairing_status = PairingStatus::Terminated;
    lct.updated_at = now;
    lct.terminated_at = Some(now);
    lct.terminated_by = Some(terminated_by.to_string());
    lct.termination_reason = Some(reason.to_string());
    state.put(keys::lct(lct_id), &lct)?;

    events.push(Event::LctStatusChanged {
        lct_id: *lct_id,
        old_status: old.as_str().to_string(),
        new_status: PairingStatus::Terminated.as_str().to_string(),
        reason: reason.to_string(),
    });
    if notify_offline {
        info!(lct_id = %lct_id, "offline participants will observe termination at next dequeue");
    }
    warn!(lct_id = %lct_id, reason, "LCT terminated");
    Ok(lct)
}

// ── Access validation ────────────────────────────────────────────────────────

/// Gate an operation through an LCT. Succeeds only for an active LCT and a
/// requester that is component A, component B, or the registered proxy;
/// proxies are limited to the relay-class operations.
pub fn validate_lct_access(
    state: &mut Overlay<'_>,
    requester: &ComponentId,
    lct_id: &LctId,
    operation: &str,
    now: TimestampNs,
) -> Result<AccessDecision, LedgerError> {
    let mut lct = require_lct(state, lct_id)?;

    if lct.pairing_status != PairingStatus::Active {
        return Ok(AccessDecision::denied(lct.pairing_status.as_str()));
    }

    let is_participant = *requester == lct.component_a_id || *requester == lct.component_b_id;
    let is_proxy = lct.proxy_component_id.as_ref() == Some(requester);
    if !is_participant && !is_proxy {
        return Ok(AccessDecision::denied("not a participant"));
    }
    if is_proxy && !PROXY_OPERATIONS.contains(&operation) {
        return Ok(AccessDecision::denied("operation not permitted for proxy"));
    }

    lct.last_contact_at = Some(now);
    state.put(keys::lct(lct_id), &lct)?;

    Ok(AccessDecision {
        valid: true,
        access_level: if is_proxy {
            AccessLevel::Restricted
        } else {
            AccessLevel::Standard
        },
        reason: None,
    })
}

// ── Integrity check ──────────────────────────────────────────────────────────

/// Structural audit of a stored LCT: required fields present, status in a
/// cryptographically live state, key reference well-formed.
pub fn validate_lct_cryptographic_integrity(
    state: &Overlay<'_>,
    lct_id: &LctId,
) -> Result<bool, LedgerError> {
    let lct = match get_lct(state, lct_id)? {
        Some(lct) => lct,
        None => return Ok(false),
    };
    if lct.trust_anchor.is_empty() || lct.operational_context.is_empty() {
        return Ok(false);
    }
    if !matches!(
        lct.pairing_status,
        PairingStatus::Pending | PairingStatus::ChallengePending | PairingStatus::Active
    ) {
        return Ok(false);
    }
    if lct.key_reference.is_zero() {
        return Ok(false);
    }
    Ok(true)
}

// ── Message encryption helper ────────────────────────────────────────────────

/// AEAD-encrypt a message under a caller-supplied session key. The key comes
/// from the off-chain key holder; it is never read from or written to state.
pub fn encrypt_lct_message(
    state: &Overlay<'_>,
    events: &mut Vec<Event>,
    lct_id: &LctId,
    session_key: &[u8; 32],
    plaintext: &[u8],
) -> Result<Vec<u8>, LedgerError> {
    let lct = require_lct(state, lct_id)?;
    if lct.pairing_status != PairingStatus::Active {
        return Err(LedgerError::LctNotActive(*lct_id));
    }
    let sealed =
        crypto::encrypt_with_key(session_key, plaintext).map_err(|_| LedgerError::CryptoFailure)?;
    events.push(Event::LctMessageEncrypted {
        lct_id: *lct_id,
        payload_len: sealed.len() as u64,
    });
    Ok(sealed)
}

// ── Audit helpers ────────────────────────────────────────────────────────────

/// True when every stored LCT satisfies the canonical component order.
pub fn audit_canonical_order(state: &Overlay<'_>) -> Result<bool, LedgerError> {
    let all: Vec<(Vec<u8>, LinkedContextToken)> = state.scan_prefix_as(keys::LCT.as_bytes())?;
    Ok(all
        .iter()
        .all(|(_, lct)| lct.component_a_id <= lct.component_b_id))
}

/// Every key-reference digest stored under the LCT prefix, for hash-width
/// and key-material audits.
pub fn stored_key_references(state: &Overlay<'_>) -> Result<Vec<Hash32>, LedgerError> {
    let all: Vec<(Vec<u8>, LinkedContextToken)> = state.scan_prefix_as(keys::LCT.as_bytes())?;
    Ok(all.into_iter().map(|(_, lct)| lct.key_reference).collect())
}
