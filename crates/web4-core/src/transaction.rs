use serde::{Deserialize, Serialize};

use crate::codec::{CanonicalReader, CanonicalWriter};
use crate::error::LedgerError;
use crate::types::{
    ComponentId, Hash32, LctId, OperationId, PairingId, PublicKey32, RequestId, Signature64,
    TensorId, TimestampNs, TxId,
};

// ── Shared payload vocabulary ────────────────────────────────────────────────

/// Pairing authorization strength. Each level carries a minimum trust floor;
/// the effective floor for a pair is the maximum of both sides' levels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthorizationLevel {
    Basic,
    Enhanced,
    Critical,
}

impl AuthorizationLevel {
    pub fn trust_floor(&self) -> f64 {
        match self {
            AuthorizationLevel::Basic => crate::constants::TRUST_FLOOR_BASIC,
            AuthorizationLevel::Enhanced => crate::constants::TRUST_FLOOR_ENHANCED,
            AuthorizationLevel::Critical => crate::constants::TRUST_FLOOR_CRITICAL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationLevel::Basic => "basic",
            AuthorizationLevel::Enhanced => "enhanced",
            AuthorizationLevel::Critical => "critical",
        }
    }
}

/// Scope of an anonymous revocation event.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RevocationType {
    Individual,
    Class,
    Manufacturer,
}

/// Trust tensor family.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TensorType {
    /// Talent / training / temperament.
    T3,
    /// Valuation / veracity / validity.
    V3,
}

impl TensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorType::T3 => "T3",
            TensorType::V3 => "V3",
        }
    }
}

/// Energy operation flavours and their trust floors.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnergyOperationType {
    Transfer,
    EfficientTransfer,
}

impl EnergyOperationType {
    pub fn trust_floor(&self) -> f64 {
        match self {
            EnergyOperationType::Transfer => crate::constants::TRUST_MIN_TRANSFER,
            EnergyOperationType::EfficientTransfer => {
                crate::constants::TRUST_MIN_EFFICIENT_TRANSFER
            }
        }
    }
}

/// Offline queue priority classes, highest first.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueuePriority {
    Critical,
    High,
    Medium,
    Low,
    Offline,
}

impl QueuePriority {
    /// Single digit used in queue storage keys so sled's ordered iteration
    /// yields priority-then-FIFO order.
    pub fn key_digit(&self) -> u8 {
        match self {
            QueuePriority::Critical => b'0',
            QueuePriority::High => b'1',
            QueuePriority::Medium => b'2',
            QueuePriority::Low => b'3',
            QueuePriority::Offline => b'4',
        }
    }
}

/// Society role categories recognised by the law oracle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoleType {
    Orchestrator,
    Queen,
    Worker,
    Witness,
    Oracle,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Orchestrator => "orchestrator",
            RoleType::Queen => "queen",
            RoleType::Worker => "worker",
            RoleType::Witness => "witness",
            RoleType::Oracle => "oracle",
        }
    }
}

/// The six-element R6 compliance frame. All six must be non-empty for a
/// role transaction to pass the compliance delegate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct R6 {
    pub rules: String,
    pub roles: String,
    pub request: String,
    pub reference: String,
    pub resource: String,
    pub result: String,
}

impl R6 {
    pub fn is_complete(&self) -> bool {
        !self.rules.is_empty()
            && !self.roles.is_empty()
            && !self.request.is_empty()
            && !self.reference.is_empty()
            && !self.resource.is_empty()
            && !self.result.is_empty()
    }
}

// ── Witness ──────────────────────────────────────────────────────────────────

/// Witness attestation attached to transactions and blocks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Witness {
    /// LCT through which the witness relationship exists.
    pub lct_id: LctId,
    pub signature: Signature64,
    pub timestamp_ns: TimestampNs,
    pub confidence: f32,
}

impl Witness {
    pub fn encode(&self, w: &mut CanonicalWriter) {
        w.put_varstr(&self.lct_id.to_hex());
        w.put_signature(&self.signature);
        w.put_u64(self.timestamp_ns);
        w.put_f32(self.confidence);
    }

    pub fn decode(r: &mut CanonicalReader<'_>) -> Result<Self, LedgerError> {
        let lct_hex = r.get_varstr()?;
        let lct_id = Hash32::from_hex(&lct_hex)
            .map_err(|_| LedgerError::Serialization("witness lct_id not 64 hex".into()))?;
        Ok(Self {
            lct_id,
            signature: r.get_signature()?,
            timestamp_ns: r.get_u64()?,
            confidence: r.get_f32()?,
        })
    }
}

// ── TxKind ───────────────────────────────────────────────────────────────────

/// Wire discriminant for each payload variant. Values are frozen: they are
/// part of the canonical byte format.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxKind {
    LctCreate = 0,
    LctStatusUpdate = 1,
    LctTerminate = 2,
    LctPairingInitiate = 3,
    LctPairingComplete = 4,
    RegisterComponent = 5,
    VerifyComponent = 6,
    CreatePairingAuthorization = 7,
    UpdateAuthorization = 8,
    RevokeAuthorization = 9,
    CreateAnonymousRevocationEvent = 10,
    TrustTensorCreate = 11,
    TrustScoreUpdate = 12,
    EnergyOperationCreate = 13,
    EnergyTransferExecute = 14,
    PairingQueueEnqueue = 15,
    PairingQueueCancel = 16,
    PairingQueueProcessOffline = 17,
    AtpTransfer = 18,
    AdpGenerate = 19,
    SocietyCreate = 20,
    SocietyJoin = 21,
    SocietyLeave = 22,
    SocietyLaw = 23,
    WitnessAction = 24,
    WitnessValidate = 25,
    RoleCreate = 26,
}

impl TxKind {
    pub fn from_u8(v: u8) -> Result<Self, LedgerError> {
        use TxKind::*;
        Ok(match v {
            0 => LctCreate,
            1 => LctStatusUpdate,
            2 => LctTerminate,
            3 => LctPairingInitiate,
            4 => LctPairingComplete,
            5 => RegisterComponent,
            6 => VerifyComponent,
            7 => CreatePairingAuthorization,
            8 => UpdateAuthorization,
            9 => RevokeAuthorization,
            10 => CreateAnonymousRevocationEvent,
            11 => TrustTensorCreate,
            12 => TrustScoreUpdate,
            13 => EnergyOperationCreate,
            14 => EnergyTransferExecute,
            15 => PairingQueueEnqueue,
            16 => PairingQueueCancel,
            17 => PairingQueueProcessOffline,
            18 => AtpTransfer,
            19 => AdpGenerate,
            20 => SocietyCreate,
            21 => SocietyJoin,
            22 => SocietyLeave,
            23 => SocietyLaw,
            24 => WitnessAction,
            25 => WitnessValidate,
            26 => RoleCreate,
            other => {
                return Err(LedgerError::Serialization(format!(
                    "unknown transaction kind {other}"
                )))
            }
        })
    }

    /// Witness floor the law oracle enforces per transaction type.
    pub fn required_witnesses(&self) -> usize {
        match self {
            TxKind::SocietyCreate => 5,
            TxKind::LctCreate => 3,
            TxKind::RoleCreate => 3,
            TxKind::AtpTransfer => 2,
            TxKind::WitnessAction => 1,
            _ => 2,
        }
    }
}

// ── TxPayload ────────────────────────────────────────────────────────────────

/// The closed set of state-changing operations. One variant per transaction
/// type; no ambient untyped maps reach on-chain state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TxPayload {
    // ── LCT lifecycle ────────────────────────────────────────────────────────
    LctCreate {
        component_a: ComponentId,
        component_b: ComponentId,
        context: String,
        proxy: Option<ComponentId>,
    },
    LctStatusUpdate {
        lct_id: LctId,
        new_status: String,
        reason: String,
    },
    LctTerminate {
        lct_id: LctId,
        reason: String,
        notify_offline: bool,
    },
    LctPairingInitiate {
        initiator_lct: LctId,
        target_lct: LctId,
        context: String,
        expires_at: Option<TimestampNs>,
    },
    LctPairingComplete {
        pairing_id: PairingId,
        initiator_response: String,
        target_response: String,
        session_key_data: Vec<u8>,
    },

    // ── Component registry ───────────────────────────────────────────────────
    RegisterComponent {
        real_id: String,
        manufacturer_id: String,
        component_type: String,
    },
    VerifyComponent {
        component_hash: ComponentId,
    },
    CreatePairingAuthorization {
        component_a: ComponentId,
        component_b: ComponentId,
        rule_hash: Hash32,
        trust_score_requirement: f64,
        level: AuthorizationLevel,
        expires_at: Option<TimestampNs>,
    },
    UpdateAuthorization {
        component_a: ComponentId,
        component_b: ComponentId,
        trust_score_requirement: Option<f64>,
        level: Option<AuthorizationLevel>,
        expires_at: Option<TimestampNs>,
    },
    RevokeAuthorization {
        component_a: ComponentId,
        component_b: ComponentId,
        reason: String,
    },
    CreateAnonymousRevocationEvent {
        target_hash: ComponentId,
        revocation_type: RevocationType,
        urgency_level: String,
        reason_category: String,
    },

    // ── Trust tensors ────────────────────────────────────────────────────────
    TrustTensorCreate {
        lct_id: LctId,
        tensor_type: TensorType,
        context: String,
    },
    TrustScoreUpdate {
        tensor_id: TensorId,
        score: f64,
        witness: String,
        context: String,
    },

    // ── Energy cycle ─────────────────────────────────────────────────────────
    EnergyOperationCreate {
        source_lct_id: LctId,
        destination_lct_id: LctId,
        amount: f64,
        operation_type: EnergyOperationType,
    },
    EnergyTransferExecute {
        operation_id: OperationId,
        amount: f64,
        context: String,
    },

    // ── Offline pairing queue ────────────────────────────────────────────────
    PairingQueueEnqueue {
        component_a: ComponentId,
        component_b: ComponentId,
        operational_context: String,
        proxy_id: Option<ComponentId>,
        priority: QueuePriority,
        timeout_at: Option<TimestampNs>,
    },
    PairingQueueCancel {
        request_id: RequestId,
        reason: String,
    },
    PairingQueueProcessOffline {
        component_id: ComponentId,
    },

    // ── ATP / ADP economy ────────────────────────────────────────────────────
    AtpTransfer {
        amount: f64,
        purpose: String,
    },
    AdpGenerate {
        task: String,
        atp_consumed: f64,
        adp_generated: f64,
        r6_proof: R6,
    },

    // ── Society governance ───────────────────────────────────────────────────
    SocietyCreate {
        society_id: String,
        name: String,
        law_oracle_id: String,
        constitution_hash: Option<Hash32>,
    },
    SocietyJoin {
        society_id: String,
    },
    SocietyLeave {
        society_id: String,
    },
    SocietyLaw {
        society_id: String,
        law_id: String,
        text_hash: Hash32,
        supporters: Vec<String>,
        economic_change: bool,
    },

    // ── Witnessing / audit ───────────────────────────────────────────────────
    WitnessAction {
        action: String,
        subject: String,
    },
    WitnessValidate {
        decision_id: Hash32,
        subject_tx: TxId,
        decision: String,
        reason: String,
    },

    // ── Roles ────────────────────────────────────────────────────────────────
    RoleCreate {
        role_type: RoleType,
        holder: String,
        society_id: String,
        r6: R6,
    },
}

impl TxPayload {
    pub fn kind(&self) -> TxKind {
        use TxPayload::*;
        match self {
            LctCreate { .. } => TxKind::LctCreate,
            LctStatusUpdate { .. } => TxKind::LctStatusUpdate,
            LctTerminate { .. } => TxKind::LctTerminate,
            LctPairingInitiate { .. } => TxKind::LctPairingInitiate,
            LctPairingComplete { .. } => TxKind::LctPairingComplete,
            RegisterComponent { .. } => TxKind::RegisterComponent,
            VerifyComponent { .. } => TxKind::VerifyComponent,
            CreatePairingAuthorization { .. } => TxKind::CreatePairingAuthorization,
            UpdateAuthorization { .. } => TxKind::UpdateAuthorization,
            RevokeAuthorization { .. } => TxKind::RevokeAuthorization,
            CreateAnonymousRevocationEvent { .. } => TxKind::CreateAnonymousRevocationEvent,
            TrustTensorCreate { .. } => TxKind::TrustTensorCreate,
            TrustScoreUpdate { .. } => TxKind::TrustScoreUpdate,
            EnergyOperationCreate { .. } => TxKind::EnergyOperationCreate,
            EnergyTransferExecute { .. } => TxKind::EnergyTransferExecute,
            PairingQueueEnqueue { .. } => TxKind::PairingQueueEnqueue,
            PairingQueueCancel { .. } => TxKind::PairingQueueCancel,
            PairingQueueProcessOffline { .. } => TxKind::PairingQueueProcessOffline,
            AtpTransfer { .. } => TxKind::AtpTransfer,
            AdpGenerate { .. } => TxKind::AdpGenerate,
            SocietyCreate { .. } => TxKind::SocietyCreate,
            SocietyJoin { .. } => TxKind::SocietyJoin,
            SocietyLeave { .. } => TxKind::SocietyLeave,
            SocietyLaw { .. } => TxKind::SocietyLaw,
            WitnessAction { .. } => TxKind::WitnessAction,
            WitnessValidate { .. } => TxKind::WitnessValidate,
            RoleCreate { .. } => TxKind::RoleCreate,
        }
    }

    /// CBOR bytes placed into the canonical transaction encoding.
    pub fn to_cbor(&self) -> Result<Vec<u8>, LedgerError> {
        serde_cbor::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, LedgerError> {
        serde_cbor::from_slice(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

// ── Transaction ──────────────────────────────────────────────────────────────

/// A fully-formed transaction. `id` is SHA-256 of [`Transaction::signing_bytes`];
/// `signature` is Ed25519 over the same bytes, verified against
/// `sender_public_key`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: TxId,
    pub timestamp_ns: TimestampNs,
    /// Component hash, LCT id, or society identifier submitting the change.
    pub from: String,
    pub to: Option<String>,
    pub payload: TxPayload,
    /// Ed25519 key the signature verifies against. `None` only for the one
    /// system transaction per block (mining reward).
    pub sender_public_key: Option<PublicKey32>,
    pub signature: Signature64,
    pub witnesses: Vec<Witness>,
    /// Optional processing deadline; the pipeline aborts with `Timeout` past it.
    pub deadline_ns: Option<TimestampNs>,
}

impl Transaction {
    pub fn kind(&self) -> TxKind {
        self.payload.kind()
    }

    /// Bytes covered by the transaction id and the sender signature:
    /// type ‖ timestamp ‖ from ‖ to ‖ payload_cbor. Witnesses attest the id
    /// afterwards, so they are excluded here.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let mut w = CanonicalWriter::new();
        w.put_u8(self.kind() as u8);
        w.put_u64(self.timestamp_ns);
        w.put_varstr(&self.from);
        w.put_varbytes(self.to.as_deref().unwrap_or("").as_bytes());
        w.put_varbytes(&self.payload.to_cbor()?);
        Ok(w.into_bytes())
    }

    /// Full canonical encoding used inside block bytes.
    pub fn encode(&self, w: &mut CanonicalWriter) -> Result<(), LedgerError> {
        w.put_varstr(&self.id.to_hex());
        w.put_u8(self.kind() as u8);
        w.put_u64(self.timestamp_ns);
        w.put_varstr(&self.from);
        w.put_varbytes(self.to.as_deref().unwrap_or("").as_bytes());
        w.put_varbytes(&self.payload.to_cbor()?);
        w.put_signature(&self.signature);
        w.put_varuint(self.witnesses.len() as u64);
        for witness in &self.witnesses {
            witness.encode(w);
        }
        Ok(())
    }

    pub fn decode(r: &mut CanonicalReader<'_>) -> Result<Self, LedgerError> {
        let id_hex = r.get_varstr()?;
        let id = Hash32::from_hex(&id_hex)
            .map_err(|_| LedgerError::Serialization("tx id not 64 hex".into()))?;
        let kind = TxKind::from_u8(r.get_u8()?)?;
        let timestamp_ns = r.get_u64()?;
        let from = r.get_varstr()?;
        let to_bytes = r.get_varbytes()?;
        let to = if to_bytes.is_empty() {
            None
        } else {
            Some(String::from_utf8(to_bytes).map_err(|e| {
                LedgerError::Serialization(format!("invalid utf-8 in tx `to`: {e}"))
            })?)
        };
        let payload = TxPayload::from_cbor(&r.get_varbytes()?)?;
        if payload.kind() != kind {
            return Err(LedgerError::Serialization(format!(
                "payload kind {:?} does not match wire kind {:?}",
                payload.kind(),
                kind
            )));
        }
        let signature = r.get_signature()?;
        let witness_count = r.get_varuint()? as usize;
        let mut witnesses = Vec::with_capacity(witness_count);
        for _ in 0..witness_count {
            witnesses.push(Witness::decode(r)?);
        }
        Ok(Self {
            id,
            timestamp_ns,
            from,
            to,
            payload,
            sender_public_key: None,
            signature,
            witnesses,
            deadline_ns: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            id: Hash32::from_bytes([3u8; 32]),
            timestamp_ns: 1_700_000_000_000_000_000,
            from: Hash32::from_bytes([1u8; 32]).to_hex(),
            to: None,
            payload: TxPayload::AtpTransfer {
                amount: 42.0,
                purpose: "test".into(),
            },
            sender_public_key: None,
            signature: Signature64::from_bytes([7u8; 64]),
            witnesses: vec![Witness {
                lct_id: Hash32::from_bytes([2u8; 32]),
                signature: Signature64::from_bytes([8u8; 64]),
                timestamp_ns: 5,
                confidence: 0.9,
            }],
            deadline_ns: None,
        }
    }

    #[test]
    fn canonical_round_trip() {
        let tx = sample_tx();
        let mut w = CanonicalWriter::new();
        tx.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = CanonicalReader::new(&bytes);
        let back = Transaction::decode(&mut r).unwrap();
        assert!(r.is_empty());
        assert_eq!(back.id, tx.id);
        assert_eq!(back.payload, tx.payload);
        assert_eq!(back.witnesses, tx.witnesses);
    }

    #[test]
    fn signing_bytes_exclude_witnesses() {
        let mut tx = sample_tx();
        let before = tx.signing_bytes().unwrap();
        tx.witnesses.clear();
        tx.signature = Signature64::ZERO;
        assert_eq!(tx.signing_bytes().unwrap(), before);
    }

    #[test]
    fn witness_floor_table() {
        assert_eq!(TxKind::SocietyCreate.required_witnesses(), 5);
        assert_eq!(TxKind::LctCreate.required_witnesses(), 3);
        assert_eq!(TxKind::RoleCreate.required_witnesses(), 3);
        assert_eq!(TxKind::AtpTransfer.required_witnesses(), 2);
        assert_eq!(TxKind::WitnessAction.required_witnesses(), 1);
        assert_eq!(TxKind::VerifyComponent.required_witnesses(), 2);
    }

    #[test]
    fn kind_discriminants_are_frozen() {
        assert_eq!(TxKind::LctCreate as u8, 0);
        assert_eq!(TxKind::WitnessValidate as u8, 25);
        assert_eq!(TxKind::RoleCreate as u8, 26);
        for v in 0..=26u8 {
            assert_eq!(TxKind::from_u8(v).unwrap() as u8, v);
        }
        assert!(TxKind::from_u8(27).is_err());
    }

    #[test]
    fn authorization_floors() {
        assert_eq!(AuthorizationLevel::Basic.trust_floor(), 0.50);
        assert_eq!(AuthorizationLevel::Enhanced.trust_floor(), 0.70);
        assert_eq!(AuthorizationLevel::Critical.trust_floor(), 0.85);
    }
}
