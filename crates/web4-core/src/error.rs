use thiserror::Error;

use crate::types::Hash32;

/// Coarse error taxonomy. Every [`LedgerError`] variant maps to exactly one
/// kind; the CLI derives its exit code from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    AuthFailure,
    Unauthorized,
    CryptoFailure,
    Timeout,
    Backpressure,
    Storage,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Registry errors ──────────────────────────────────────────────────────
    #[error("component already registered: {0}")]
    DuplicateComponent(Hash32),

    #[error("component not found: {0}")]
    ComponentNotFound(Hash32),

    #[error("component unavailable: {0} is {1}")]
    ComponentUnavailable(Hash32, String),

    #[error("pairing authorization not found for ({0}, {1})")]
    AuthorizationNotFound(Hash32, Hash32),

    #[error("pairing authorization already exists for ({0}, {1})")]
    DuplicateAuthorization(Hash32, Hash32),

    #[error("pairing authorization expired")]
    AuthorizationExpired,

    #[error("pairing authorization revoked")]
    AuthorizationRevoked,

    #[error("trust score insufficient: need {need}, got {got}")]
    TrustScoreInsufficient { need: f64, got: f64 },

    // ── LCT errors ───────────────────────────────────────────────────────────
    #[error("LCT already exists: {0}")]
    DuplicateLct(Hash32),

    #[error("LCT not found: {0}")]
    LctNotFound(Hash32),

    #[error("LCT is terminated: {0}")]
    LctTerminated(Hash32),

    #[error("LCT is not active: {0}")]
    LctNotActive(Hash32),

    #[error("invalid LCT status transition: {from} → {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("caller is not a trust anchor of either LCT")]
    NotTrustAnchor,

    #[error("pairing challenge not found: {0}")]
    ChallengeNotFound(Hash32),

    #[error("pairing challenge expired")]
    ChallengeExpired,

    #[error("pairing challenge already consumed")]
    ChallengeConsumed,

    #[error("challenge response mismatch")]
    ResponseMismatch,

    #[error("split-key record not found: {0}")]
    SplitKeyNotFound(Hash32),

    // ── Trust tensor errors ──────────────────────────────────────────────────
    #[error("trust tensor already exists: {0}")]
    DuplicateTensor(Hash32),

    #[error("trust tensor not found: {0}")]
    TensorNotFound(Hash32),

    #[error("trust score out of range: {0}")]
    ScoreOutOfRange(f64),

    // ── Energy errors ────────────────────────────────────────────────────────
    #[error("energy operation not found: {0}")]
    OperationNotFound(Hash32),

    #[error("energy amount must be finite and non-negative; got {0}")]
    InvalidAmount(f64),

    #[error("energy operation re-executed with different amount: stored {stored}, got {got}")]
    AmountMismatch { stored: f64, got: f64 },

    // ── Queue errors ─────────────────────────────────────────────────────────
    #[error("queued pairing request not found: {0}")]
    RequestNotFound(Hash32),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("queued pairing request is not pending: {0}")]
    RequestNotPending(Hash32),

    // ── Transaction pipeline errors ──────────────────────────────────────────
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid hash width in field {0}")]
    InvalidHashWidth(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(Hash32),

    #[error("insufficient witnesses: {got}/{need}")]
    InsufficientWitnesses { got: usize, need: usize },

    #[error("required approver missing: {0}")]
    MissingApprover(String),

    #[error("transaction rejected by law oracle: {0}")]
    OracleRejected(String),

    #[error("transaction deadline exceeded")]
    Timeout,

    #[error("pending transaction buffer full")]
    Backpressure,

    // ── Society / governance errors ──────────────────────────────────────────
    #[error("society not found: {0}")]
    SocietyNotFound(String),

    #[error("society already exists: {0}")]
    DuplicateSociety(String),

    #[error("not a citizen of society {0}")]
    NotACitizen(String),

    #[error("governance quorum not met: {supporters}/{total} below {quorum}")]
    QuorumNotMet {
        supporters: usize,
        total: usize,
        quorum: f64,
    },

    #[error("veto entity absent from supporters: {0}")]
    VetoEntityMissing(String),

    // ── Crypto (opaque; details never cross the keeper boundary) ─────────────
    #[error("cryptographic operation failed")]
    CryptoFailure,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Map a variant to its coarse taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            MissingField(_) | InvalidHashWidth(_) | InvalidAmount(_) | ScoreOutOfRange(_) => {
                ErrorKind::InvalidInput
            }
            ComponentNotFound(_) | LctNotFound(_) | TensorNotFound(_) | OperationNotFound(_)
            | RequestNotFound(_) | RecordNotFound(_) | ChallengeNotFound(_)
            | SplitKeyNotFound(_) | SocietyNotFound(_) => ErrorKind::NotFound,
            DuplicateComponent(_) | DuplicateLct(_) | DuplicateTensor(_)
            | DuplicateAuthorization(_, _) | DuplicateTransaction(_) | DuplicateSociety(_)
            | LctTerminated(_)
            | InvalidStatusTransition { .. } | ChallengeConsumed | AmountMismatch { .. }
            | RequestNotPending(_) => ErrorKind::Conflict,
            InvalidSignature | ResponseMismatch | InsufficientWitnesses { .. }
            | MissingApprover(_) | NotTrustAnchor => ErrorKind::AuthFailure,
            AuthorizationNotFound(_, _) | AuthorizationExpired | AuthorizationRevoked
            | TrustScoreInsufficient { .. } | ComponentUnavailable(_, _) | LctNotActive(_)
            | NotACitizen(_) | QuorumNotMet { .. } | VetoEntityMissing(_)
            | OracleRejected(_) => ErrorKind::Unauthorized,
            ChallengeExpired | Timeout => ErrorKind::Timeout,
            Backpressure => ErrorKind::Backpressure,
            CryptoFailure => ErrorKind::CryptoFailure,
            Serialization(_) | Storage(_) => ErrorKind::Storage,
        }
    }
}
