use serde::{Deserialize, Serialize};

use crate::types::{
    ChallengeId, ComponentId, Hash32, LctId, OperationId, PairingId, RequestId, TensorId,
    TimestampNs, TxId,
};

/// Typed events appended by keepers during transaction application.
///
/// Emission is a contract: every field is derivable from the transaction and
/// the post-state alone, so re-running a block reproduces its event log
/// byte-for-byte.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // ── Registry ─────────────────────────────────────────────────────────────
    ComponentRegistered {
        component_hash: ComponentId,
    },
    AnonymousComponentRegistered {
        component_hash: ComponentId,
        manufacturer_hash: Hash32,
        category_hash: Hash32,
    },
    ComponentVerified {
        component_hash: ComponentId,
        verifier: String,
        status: String,
    },
    ComponentPairingVerifiedWithHashes {
        component_a: ComponentId,
        component_b: ComponentId,
        can_pair: bool,
        trust_score: f64,
    },
    AnonymousPairingAuthorized {
        component_a: ComponentId,
        component_b: ComponentId,
        level: String,
    },
    AnonymousRevocationCreated {
        target_hash: ComponentId,
        revocation_type: String,
        urgency_level: String,
    },
    AuthorizationCreated {
        component_a: ComponentId,
        component_b: ComponentId,
        version: u64,
    },
    AuthorizationUpdated {
        component_a: ComponentId,
        component_b: ComponentId,
        version: u64,
    },
    AuthorizationRevoked {
        component_a: ComponentId,
        component_b: ComponentId,
        reason: String,
    },

    // ── LCT lifecycle ────────────────────────────────────────────────────────
    LctCreated {
        lct_id: LctId,
        component_a: ComponentId,
        component_b: ComponentId,
        context: String,
    },
    LctStatusChanged {
        lct_id: LctId,
        old_status: String,
        new_status: String,
        reason: String,
    },
    LctMediatedPairingInitiated {
        pairing_id: PairingId,
        initiator_lct: LctId,
        target_lct: LctId,
        expires_at: TimestampNs,
    },
    LctMediatedPairingCompleted {
        pairing_id: PairingId,
        lct_id: LctId,
    },
    LctMessageEncrypted {
        lct_id: LctId,
        payload_len: u64,
    },
    LctChallengeGenerated {
        challenge_id: ChallengeId,
        pairing_id: PairingId,
        expires_at: TimestampNs,
    },
    LctChallengeVerified {
        challenge_id: ChallengeId,
        pairing_id: PairingId,
    },

    // ── Offline queue ────────────────────────────────────────────────────────
    PairingRequestQueued {
        request_id: RequestId,
        component_a: ComponentId,
        component_b: ComponentId,
        priority: String,
    },
    PairingRequestCancelled {
        request_id: RequestId,
        reason: String,
    },
    OfflineQueueProcessed {
        component_id: ComponentId,
        processed: u64,
        failed: u64,
        timed_out: u64,
    },

    // ── Trust tensors ────────────────────────────────────────────────────────
    TrustTensorCreated {
        tensor_id: TensorId,
        lct_id: LctId,
        tensor_type: String,
        context: String,
    },
    TensorScoreUpdated {
        tensor_id: TensorId,
        old_score: f64,
        new_score: f64,
        witness: String,
    },
    RelationshipTrustCalculated {
        component_a: ComponentId,
        component_b: ComponentId,
        score: f64,
        no_witnesses: bool,
    },

    // ── Energy cycle ─────────────────────────────────────────────────────────
    EnergyOperationCreated {
        operation_id: OperationId,
        source_lct_id: LctId,
        destination_lct_id: LctId,
        amount: f64,
        operation_type: String,
    },
    EnergyTransfer {
        operation_id: OperationId,
        amount: f64,
    },
    AtpTransfer {
        from: String,
        to: String,
        amount: f64,
        purpose: String,
    },
    AdpGenerate {
        task: String,
        atp_consumed: f64,
        adp_generated: f64,
    },

    // ── Block engine / oracle ────────────────────────────────────────────────
    BlockMined {
        index: u64,
        hash: Hash32,
        tx_count: u64,
        miner: String,
    },
    OracleDecision {
        tx_id: TxId,
        decision: String,
        reason: String,
    },
}

impl Event {
    /// Wire name of the event, matching the protocol event vocabulary.
    pub fn name(&self) -> &'static str {
        use Event::*;
        match self {
            ComponentRegistered { .. } => "component_registered",
            AnonymousComponentRegistered { .. } => "anonymous_component_registered",
            ComponentVerified { .. } => "component_verified",
            ComponentPairingVerifiedWithHashes { .. } => "component_pairing_verified_with_hashes",
            AnonymousPairingAuthorized { .. } => "anonymous_pairing_authorized",
            AnonymousRevocationCreated { .. } => "anonymous_revocation_created",
            AuthorizationCreated { .. } => "authorization_created",
            AuthorizationUpdated { .. } => "authorization_updated",
            AuthorizationRevoked { .. } => "authorization_revoked",
            LctCreated { .. } => "lct_created",
            LctStatusChanged { .. } => "lct_status_changed",
            LctMediatedPairingInitiated { .. } => "lct_mediated_pairing_initiated",
            LctMediatedPairingCompleted { .. } => "lct_mediated_pairing_completed",
            LctMessageEncrypted { .. } => "lct_message_encrypted",
            LctChallengeGenerated { .. } => "lct_challenge_generated",
            LctChallengeVerified { .. } => "lct_challenge_verified",
            PairingRequestQueued { .. } => "pairing_request_queued",
            PairingRequestCancelled { .. } => "pairing_request_cancelled",
            OfflineQueueProcessed { .. } => "offline_queue_processed",
            TrustTensorCreated { .. } => "trust_tensor_created",
            TensorScoreUpdated { .. } => "tensor_score_updated",
            RelationshipTrustCalculated { .. } => "relationship_trust_calculated",
            EnergyOperationCreated { .. } => "energy_operation_created",
            EnergyTransfer { .. } => "energy_transfer",
            AtpTransfer { .. } => "atp_transfer",
            AdpGenerate { .. } => "adp_generate",
            BlockMined { .. } => "block_mined",
            OracleDecision { .. } => "oracle_decision",
        }
    }
}
