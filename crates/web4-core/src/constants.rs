//! ─── Web4 Ledger Protocol Constants ─────────────────────────────────────────
//!
//! Trust floors, witness requirements, economics, and operational defaults.
//! Values the law oracle enforces live here so keepers and tests agree on
//! a single source.

// ── Authorization trust floors ───────────────────────────────────────────────

/// Minimum relationship trust for a `basic` pairing authorization.
pub const TRUST_FLOOR_BASIC: f64 = 0.50;

/// Minimum relationship trust for an `enhanced` pairing authorization.
pub const TRUST_FLOOR_ENHANCED: f64 = 0.70;

/// Minimum relationship trust for a `critical` pairing authorization.
pub const TRUST_FLOOR_CRITICAL: f64 = 0.85;

// ── Trust tensor behaviour ───────────────────────────────────────────────────

/// Score assumed when no tensor exists for a relationship.
pub const TRUST_DEFAULT_NO_TENSOR: f64 = 0.5;

/// Maximum per-update movement of a tensor score (oscillation dampening).
pub const TENSOR_DAMPENING_DELTA: f64 = 0.1;

/// Distinct corroborating witnesses required before dampening is lifted.
pub const TENSOR_DAMPENING_WITNESSES: usize = 3;

// ── Energy cycle ─────────────────────────────────────────────────────────────

/// Minimum relationship trust for a plain energy transfer.
pub const TRUST_MIN_TRANSFER: f64 = 0.5;

/// Minimum relationship trust for an efficient energy transfer.
pub const TRUST_MIN_EFFICIENT_TRANSFER: f64 = 0.7;

// ── Pairing protocol ─────────────────────────────────────────────────────────

/// Default challenge lifetime when the initiator does not set one: 5 minutes.
pub const CHALLENGE_DEFAULT_TTL_NS: u64 = 300 * 1_000_000_000;

/// Domain tag appended to the 32 random challenge bytes. Fixed width keeps
/// challenge_data at exactly 44 bytes.
pub const CHALLENGE_CONTEXT_TAG: [u8; 12] = *b"lct-pairing1";

/// Default pairing authorization lifetime: one year.
pub const AUTHORIZATION_DEFAULT_TTL_NS: u64 = 365 * 24 * 3600 * 1_000_000_000;

// ── Block engine ─────────────────────────────────────────────────────────────

/// Leading zero hex digits required of a block hash.
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Admission limit of the pending transaction buffer.
pub const DEFAULT_MAX_PENDING: usize = 4096;

/// Per-block sealing timeout in milliseconds.
pub const DEFAULT_BLOCK_TIMEOUT_MS: u64 = 5000;

// ── Economics (law-oracle enforced) ──────────────────────────────────────────

/// ATP minted to the miner of each sealed block.
pub const MINING_REWARD_ATP: f64 = 100.0;

/// Maximum ATP a single `atp_transfer` may move.
pub const ATP_MAX_AMOUNT: f64 = 1000.0;

/// Maximum ATP an identity may transfer per UTC calendar day.
pub const ATP_DAILY_MAX: f64 = 10_000.0;

/// Maximum ADP-generated / ATP-consumed ratio for `adp_generate`.
pub const ADP_RATIO_MAX: f64 = 2.0;

/// Minimum witness reward.
pub const WITNESS_REWARD_MIN: f64 = 1.0;

// ── Governance ───────────────────────────────────────────────────────────────

/// Supporter quorum for `society_law` updates.
pub const QUORUM_LAW_UPDATE: f64 = 0.66;

/// Supporter quorum for economic-rule changes.
pub const QUORUM_ECONOMIC: f64 = 0.75;

// ── Offline pairing queue ────────────────────────────────────────────────────

/// Requests drained per `process_offline_queue` call.
pub const QUEUE_BATCH_SIZE: usize = 32;

/// Failed-processing retries before a request is cancelled.
pub const QUEUE_MAX_RETRIES: u32 = 3;

/// Default lifetime of a queued pairing request: one day.
pub const QUEUE_DEFAULT_TTL_NS: u64 = 24 * 3600 * 1_000_000_000;

// ── Time ─────────────────────────────────────────────────────────────────────

/// Nanoseconds per UTC calendar day, for the daily ATP accounting window.
pub const NS_PER_DAY: u64 = 86_400 * 1_000_000_000;
