//! LCT-side on-chain records.
//!
//! None of these structs ever holds key material: the ledger stores the
//! SHA-256 reference of a combined key, never a half, a shared secret, or a
//! session key.

use serde::{Deserialize, Serialize};

use web4_core::types::{
    ChallengeId, ComponentId, Hash32, LctId, PairingId, TimestampNs,
};

// ── Pairing status ───────────────────────────────────────────────────────────

/// The LCT lifecycle state machine. `Terminated` is terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PairingStatus {
    Pending,
    ChallengePending,
    Active,
    Suspended,
    Expired,
    Terminated,
}

impl PairingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStatus::Pending => "pending",
            PairingStatus::ChallengePending => "challenge_pending",
            PairingStatus::Active => "active",
            PairingStatus::Suspended => "suspended",
            PairingStatus::Expired => "expired",
            PairingStatus::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => PairingStatus::Pending,
            "challenge_pending" => PairingStatus::ChallengePending,
            "active" => PairingStatus::Active,
            "suspended" => PairingStatus::Suspended,
            "expired" => PairingStatus::Expired,
            "terminated" => PairingStatus::Terminated,
            _ => return None,
        })
    }
}

// ── LinkedContextToken ───────────────────────────────────────────────────────

/// The relationship between two components, canonically ordered so that
/// `component_a_id < component_b_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinkedContextToken {
    pub lct_id: LctId,
    pub component_a_id: ComponentId,
    pub component_b_id: ComponentId,
    pub pairing_status: PairingStatus,
    /// Interaction domain, e.g. `energy_transfer`.
    pub operational_context: String,
    /// Optional mediating third component.
    pub proxy_component_id: Option<ComponentId>,
    /// Authority that authorized creation.
    pub trust_anchor: String,
    /// SHA-256 digest that lets off-chain key holders locate their material.
    /// The ledger stores only this reference.
    pub key_reference: Hash32,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
    pub last_contact_at: Option<TimestampNs>,
    pub terminated_at: Option<TimestampNs>,
    pub terminated_by: Option<String>,
    pub termination_reason: Option<String>,
}

// ── SplitKeyRecord ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SplitKeyStatus {
    Pending,
    Active,
    Revoked,
}

/// On-chain shadow of an off-chain split key pair. Holds no key material.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SplitKeyRecord {
    pub pairing_id: PairingId,
    pub challenge_id: ChallengeId,
    pub initiator_lct: LctId,
    pub target_lct: LctId,
    pub status: SplitKeyStatus,
    /// SHA-256 of the session key data exchanged at completion.
    pub hashed_session_key: Option<Hash32>,
    pub created_at: TimestampNs,
    pub activated_at: Option<TimestampNs>,
}

// ── PairingChallenge ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Consumed,
    Expired,
}

/// Short-lived authentication artifact for mediated pairing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PairingChallenge {
    pub challenge_id: ChallengeId,
    pub pairing_id: PairingId,
    /// 32 random bytes followed by the 12-byte context tag (44 bytes total).
    pub challenge_data: Vec<u8>,
    /// SHA-256 of `challenge_data`; both sides must answer with its hex form.
    pub expected_response: Hash32,
    pub expires_at: TimestampNs,
    pub status: ChallengeStatus,
}

// ── Access validation ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    Standard,
    Restricted,
    Denied,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Standard => "standard",
            AccessLevel::Restricted => "restricted",
            AccessLevel::Denied => "denied",
        }
    }
}

/// Result of [`crate::validate_lct_access`].
#[derive(Clone, Debug, PartialEq)]
pub struct AccessDecision {
    pub valid: bool,
    pub access_level: AccessLevel,
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn denied(reason: &str) -> Self {
        Self {
            valid: false,
            access_level: AccessLevel::Denied,
            reason: Some(reason.to_string()),
        }
    }
}
