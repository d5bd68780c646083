//! Split-key mediated pairing.
//!
//! Neither side ever holds the full key. The ledger issues a challenge,
//! verifies both responses in constant time, derives two ephemeral halves,
//! hands each side its packaged halves, and keeps only
//! SHA-256(session_key_data). Every secret temporary is wiped before
//! return on success and error paths alike.

use tracing::{info, warn};

use web4_core::constants::{CHALLENGE_CONTEXT_TAG, CHALLENGE_DEFAULT_TTL_NS};
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::types::{ChallengeId, Hash32, LctId, PairingId, TimestampNs};
use web4_crypto as crypto;
use web4_store::{keys, Overlay};

use crate::manager::require_lct;
use crate::records::{
    ChallengeStatus, PairingChallenge, PairingStatus, SplitKeyRecord, SplitKeyStatus,
};

/// Result of pairing initiation. `challenge_data` is handed to both sides
/// off-chain; the stored record keeps only its hash as the expected response.
#[derive(Debug)]
pub struct PairingInit {
    pub pairing_id: PairingId,
    pub challenge_id: ChallengeId,
    pub challenge_data: Vec<u8>,
    pub expires_at: TimestampNs,
}

/// Result of pairing completion. Each package is the AEAD-sealed pair of
/// ephemeral halves, ordered for its recipient.
#[derive(Debug)]
pub struct PairingCompletion {
    pub initiator_package: Vec<u8>,
    pub target_package: Vec<u8>,
    pub hashed_session_key: Hash32,
}

// ── Initiation ───────────────────────────────────────────────────────────────

/// Open a mediated pairing between two LCTs. Only a trust anchor of either
/// LCT may initiate.
pub fn initiate_lct_mediated_pairing(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    caller: &str,
    initiator_lct: &LctId,
    target_lct: &LctId,
    _context: &str,
    expires_at: Option<TimestampNs>,
    now: TimestampNs,
) -> Result<PairingInit, LedgerError> {
    let initiator = require_lct(state, initiator_lct)?;
    let target = require_lct(state, target_lct)?;

    if caller != initiator.trust_anchor && caller != target.trust_anchor {
        warn!(caller, "pairing initiation refused: not a trust anchor");
        return Err(LedgerError::NotTrustAnchor);
    }
    if initiator.pairing_status == PairingStatus::Terminated {
        return Err(LedgerError::LctTerminated(*initiator_lct));
    }
    if target.pairing_status == PairingStatus::Terminated {
        return Err(LedgerError::LctTerminated(*target_lct));
    }
    if initiator.pairing_status != PairingStatus::Pending {
        return Err(LedgerError::InvalidStatusTransition {
            from: initiator.pairing_status.as_str().to_string(),
            to: PairingStatus::ChallengePending.as_str().to_string(),
        });
    }

    let pairing_id = PairingId::from_bytes(crypto::sha256_concat(&[
        b"pairing:",
        initiator_lct.as_bytes(),
        target_lct.as_bytes(),
        &now.to_le_bytes(),
    ]));
    let challenge_id =
        ChallengeId::from_bytes(crypto::sha256_concat(&[b"challenge:", pairing_id.as_bytes()]));

    // 32 random bytes followed by the fixed context tag: 44 bytes total.
    let random = crypto::generate_key_share().map_err(|_| LedgerError::CryptoFailure)?;
    let mut challenge_data = Vec::with_capacity(44);
    challenge_data.extend_from_slice(&random[..]);
    challenge_data.extend_from_slice(&CHALLENGE_CONTEXT_TAG);

    let expires = expires_at.unwrap_or(now + CHALLENGE_DEFAULT_TTL_NS);
    let challenge = PairingChallenge {
        challenge_id,
        pairing_id,
        challenge_data: challenge_data.clone(),
        expected_response: crypto::sha256_hash(&challenge_data),
        expires_at: expires,
        status: ChallengeStatus::Pending,
    };
    state.put(keys::challenge(&challenge_id), &challenge)?;

    let split = SplitKeyRecord {
        pairing_id,
        challenge_id,
        initiator_lct: *initiator_lct,
        target_lct: *target_lct,
        status: SplitKeyStatus::Pending,
        hashed_session_key: None,
        created_at: now,
        activated_at: None,
    };
    state.put(keys::split(&pairing_id), &split)?;

    let mut initiator = initiator;
    let old = initiator.pairing_status;
    initiator.pairing_status = PairingStatus::ChallengePending;
    initiator.updated_at = now;
    state.put(keys::lct(initiator_lct), &initiator)?;

    events.push(Event::LctStatusChanged {
        lct_id: *initiator_lct,
        old_status: old.as_str().to_string(),
        new_status: PairingStatus::ChallengePending.as_str().to_string(),
        reason: "pairing initiated".into(),
    });
    events.push(Event::LctChallengeGenerated {
        challenge_id,
        pairing_id,
        expires_at: expires,
    });
    events.push(Event::LctMediatedPairingInitiated {
        pairing_id,
        initiator_lct: *initiator_lct,
        target_lct: *target_lct,
        expires_at: expires,
    });
    info!(pairing_id = %pairing_id, "mediated pairing initiated");
    Ok(PairingInit {
        pairing_id,
        challenge_id,
        challenge_data,
        expires_at: expires,
    })
}

// ── Completion ───────────────────────────────────────────────────────────────

/// Complete a mediated pairing. Both responses must equal the stored
/// expected response under a constant-time comparison.
pub fn complete_lct_mediated_pairing(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    pairing_id: &PairingId,
    initiator_response: &str,
    target_response: &str,
    session_key_data: &[u8],
    now: TimestampNs,
) -> Result<PairingCompletion, LedgerError> {
    if session_key_data.is_empty() {
        return Err(LedgerError::MissingField("session_key_data"));
    }
    let mut split: SplitKeyRecord = state
        .get(&keys::split(pairing_id))?
        .ok_or(LedgerError::SplitKeyNotFound(*pairing_id))?;
    if split.status != SplitKeyStatus::Pending {
        return Err(LedgerError::ChallengeConsumed);
    }
    let mut challenge: PairingChallenge = state
        .get(&keys::challenge(&split.challenge_id))?
        .ok_or(LedgerError::ChallengeNotFound(split.challenge_id))?;
    match challenge.status {
        ChallengeStatus::Pending => {}
        ChallengeStatus::Consumed => return Err(LedgerError::ChallengeConsumed),
        ChallengeStatus::Expired => return Err(LedgerError::ChallengeExpired),
    }
    if now >= challenge.expires_at {
        return Err(LedgerError::ChallengeExpired);
    }

    let expected = challenge.expected_response.to_hex();
    let initiator_ok = crypto::compare_response(initiator_response.as_bytes(), expected.as_bytes());
    let target_ok = crypto::compare_response(target_response.as_bytes(), expected.as_bytes());
    if !initiator_ok || !target_ok {
        warn!(pairing_id = %pairing_id, "challenge response mismatch");
        return Err(LedgerError::ResponseMismatch);
    }

    // Ephemeral split halves. Wrapped for each side under a key derived from
    // the session key data, then wiped.
    let half_a = crypto::generate_key_share().map_err(|_| LedgerError::CryptoFailure)?;
    let half_b = crypto::generate_key_share().map_err(|_| LedgerError::CryptoFailure)?;
    // Domain-separated from the stored hash: knowing
    // SHA-256(session_key_data) must not unlock the packages.
    let mut wrap_key = crypto::sha256_concat(&[b"wrap:", session_key_data]);

    let mut forward = [0u8; 64];
    forward[..32].copy_from_slice(&half_a[..]);
    forward[32..].copy_from_slice(&half_b[..]);
    let mut reverse = [0u8; 64];
    reverse[..32].copy_from_slice(&half_b[..]);
    reverse[32..].copy_from_slice(&half_a[..]);

    let initiator_package = crypto::encrypt_with_key(&wrap_key, &forward);
    let target_package = crypto::encrypt_with_key(&wrap_key, &reverse);
    crypto::wipe(&mut forward);
    crypto::wipe(&mut reverse);
    crypto::wipe(&mut wrap_key);
    let initiator_package = initiator_package.map_err(|_| LedgerError::CryptoFailure)?;
    let target_package = target_package.map_err(|_| LedgerError::CryptoFailure)?;

    let hashed_session_key = crypto::sha256_hash(session_key_data);

    challenge.status = ChallengeStatus::Consumed;
    state.put(keys::challenge(&challenge.challenge_id), &challenge)?;

    split.status = SplitKeyStatus::Active;
    split.hashed_session_key = Some(hashed_session_key);
    split.activated_at = Some(now);
    state.put(keys::split(pairing_id), &split)?;

    for lct_id in [split.initiator_lct, split.target_lct] {
        let mut lct = require_lct(state, &lct_id)?;
        if lct.pairing_status == PairingStatus::Active {
            continue;
        }
        let old = lct.pairing_status;
        lct.pairing_status = PairingStatus::Active;
        lct.updated_at = now;
        state.put(keys::lct(&lct_id), &lct)?;
        events.push(Event::LctStatusChanged {
            lct_id,
            old_status: old.as_str().to_string(),
            new_status: PairingStatus::Active.as_str().to_string(),
            reason: "pairing completed".into(),
        });
    }

    events.push(Event::LctChallengeVerified {
        challenge_id: split.challenge_id,
        pairing_id: *pairing_id,
    });
    events.push(Event::LctMediatedPairingCompleted {
        pairing_id: *pairing_id,
        lct_id: split.initiator_lct,
    });
    info!(pairing_id = %pairing_id, "mediated pairing completed");
    Ok(PairingCompletion {
        initiator_package,
        target_package,
        hashed_session_key,
    })
}

// ── Lazy expiry ──────────────────────────────────────────────────────────────

/// Mark an expired challenge and move the initiating LCT to `Expired`.
/// Called by the pipeline after a completion attempt fails with
/// `ChallengeExpired`, so the transition persists even though the
/// completing transaction does not.
pub fn expire_challenge(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    pairing_id: &PairingId,
    now: TimestampNs,
) -> Result<(), LedgerError> {
    let split: SplitKeyRecord = state
        .get(&keys::split(pairing_id))?
        .ok_or(LedgerError::SplitKeyNotFound(*pairing_id))?;
    let mut challenge: PairingChallenge = state
        .get(&keys::challenge(&split.challenge_id))?
        .ok_or(LedgerError::ChallengeNotFound(split.challenge_id))?;
    if challenge.status != ChallengeStatus::Pending {
        return Ok(());
    }
    challenge.status = ChallengeStatus::Expired;
    state.put(keys::challenge(&challenge.challenge_id), &challenge)?;

    let mut lct = require_lct(state, &split.initiator_lct)?;
    if lct.pairing_status == PairingStatus::ChallengePending {
        let old = lct.pairing_status;
        lct.pairing_status = PairingStatus::Expired;
        lct.updated_at = now;
        state.put(keys::lct(&split.initiator_lct), &lct)?;
        events.push(Event::LctStatusChanged {
            lct_id: split.initiator_lct,
            old_status: old.as_str().to_string(),
            new_status: PairingStatus::Expired.as_str().to_string(),
            reason: "challenge expired".into(),
        });
    }
    Ok(())
}
