//! On-chain registry records. Raw identifiers, manufacturer data, and
//! metadata never appear here; only their SHA-256 digests do.

use serde::{Deserialize, Serialize};

use web4_core::transaction::AuthorizationLevel;
use web4_core::types::{ComponentId, Hash32, LctId, TimestampNs};

// ── Component ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComponentStatus {
    Active,
    Revoked,
    Unknown,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Active => "active",
            ComponentStatus::Revoked => "revoked",
            ComponentStatus::Unknown => "unknown",
        }
    }
}

/// An anonymously registered component. One record per `component_id`;
/// never destroyed, only revoked.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Component {
    /// SHA-256 of the real component id.
    pub component_id: ComponentId,
    pub manufacturer_hash: Hash32,
    pub category_hash: Hash32,
    pub authorization_rules_hash: Hash32,
    pub status: ComponentStatus,
    /// Identifier of the registering authority.
    pub trust_anchor: String,
    pub registered_at: TimestampNs,
    pub last_verified_at: Option<TimestampNs>,
    /// LCT ids this component participates in (hash-keyed indirection,
    /// resolved by lookup, never a direct object cycle).
    pub relationship_hashes: Vec<LctId>,
}

// ── Verification ─────────────────────────────────────────────────────────────

/// One verification attempt against a component. The full log is stored
/// under `verification/<hash>`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComponentVerification {
    pub component_hash: ComponentId,
    pub verifier: String,
    pub result: String,
    pub verified_at: TimestampNs,
    pub notes: String,
}

// ── PairingAuthorization ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Active,
    Revoked,
}

/// Bidirectional pairing permission between two component hashes, keyed on
/// the canonically ordered pair. Revocation is final.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PairingAuthorization {
    pub component_a: ComponentId,
    pub component_b: ComponentId,
    pub rule_hash: Hash32,
    pub authorization_level: AuthorizationLevel,
    pub trust_score_requirement: f64,
    pub status: AuthorizationStatus,
    pub version: u64,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
    pub expires_at: TimestampNs,
}

impl PairingAuthorization {
    /// Effective trust floor: the explicit requirement, but never below the
    /// level's own floor.
    pub fn effective_requirement(&self) -> f64 {
        self.trust_score_requirement
            .max(self.authorization_level.trust_floor())
    }
}

// ── Pairing check result ─────────────────────────────────────────────────────

/// Outcome of a hash-based pairing check.
#[derive(Clone, Debug, PartialEq)]
pub struct PairingCheck {
    pub can_pair: bool,
    pub reason: String,
    pub trust_score: f64,
    /// Set when the trust score came from a default rather than witnessed data.
    pub no_witnesses: bool,
}
