//! Deterministic genesis: block 0 carries the founding `society_create`
//! transaction and seeds the orchestrator and queen roles.

use serde::{Deserialize, Serialize};
use tracing::info;

use web4_core::block::{Block, MrhSets};
use web4_core::error::LedgerError;
use web4_core::transaction::{RoleType, Transaction, TxPayload, Witness, R6};
use web4_core::types::{Hash32, Signature64, TimestampNs};
use web4_crypto as crypto;
use web4_store::{keys, Overlay, Store};

use crate::config::LedgerConfig;
use crate::society;

/// Genesis timestamp: 2025-01-01 00:00:00 UTC in nanoseconds.
pub const GENESIS_TIMESTAMP_NS: TimestampNs = 1_735_689_600_000_000_000;

/// Parameters that fully determine block 0. Two nodes given the same params
/// produce byte-identical genesis blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    pub society_id: String,
    pub society_name: String,
    pub law_oracle_id: String,
    /// 64-hex identity granted the orchestrator role.
    pub orchestrator: String,
    /// 64-hex identities granted the queen role.
    pub queens: Vec<String>,
    pub timestamp_ns: TimestampNs,
}

impl Default for GenesisParams {
    fn default() -> Self {
        Self {
            society_id: "society:web4".into(),
            society_name: "Web4 Society".into(),
            law_oracle_id: "oracle:law-genesis".into(),
            orchestrator: crypto::anonymize("genesis-orchestrator").to_hex(),
            queens: vec![crypto::anonymize("genesis-queen-1").to_hex()],
            timestamp_ns: GENESIS_TIMESTAMP_NS,
        }
    }
}

fn genesis_r6(role: &str) -> R6 {
    R6 {
        rules: "genesis".into(),
        roles: role.into(),
        request: "bootstrap".into(),
        reference: "constitution".into(),
        resource: "society".into(),
        result: "granted".into(),
    }
}

/// True when the store has no chain yet.
pub fn is_fresh(store: &Store) -> Result<bool, LedgerError> {
    Ok(store.get::<u64>(&keys::meta("chain_height"))?.is_none())
}

/// Build and commit block 0. Index 0 is exempt from proof-of-work; its hash
/// is still the SHA-256 of its canonical bytes.
pub fn apply_genesis(
    store: &Store,
    params: &GenesisParams,
    _config: &LedgerConfig,
) -> Result<Block, LedgerError> {
    let now = params.timestamp_ns;
    let mut state = Overlay::new(store);

    society::create_society(
        &mut state,
        &params.society_id,
        &params.society_name,
        &params.law_oracle_id,
        None,
        "genesis",
        now,
    )?;
    society::grant_role(
        &mut state,
        RoleType::Orchestrator,
        &params.orchestrator,
        &params.society_id,
        genesis_r6("orchestrator"),
        now,
    )?;
    for queen in &params.queens {
        society::grant_role(
            &mut state,
            RoleType::Queen,
            queen,
            &params.society_id,
            genesis_r6("queen"),
            now,
        )?;
    }

    let mut founding_tx = Transaction {
        id: Hash32::ZERO,
        timestamp_ns: now,
        from: "genesis".into(),
        to: None,
        payload: TxPayload::SocietyCreate {
            society_id: params.society_id.clone(),
            name: params.society_name.clone(),
            law_oracle_id: params.law_oracle_id.clone(),
            constitution_hash: None,
        },
        sender_public_key: None,
        signature: Signature64::ZERO,
        witnesses: vec![],
        deadline_ns: None,
    };
    founding_tx.id = crypto::tx_id_from_body(&founding_tx.signing_bytes()?);

    let genesis_witness = Witness {
        lct_id: crypto::anonymize("genesis-witness"),
        signature: Signature64::ZERO,
        timestamp_ns: now,
        confidence: 1.0,
    };

    let mut block = Block {
        index: 0,
        timestamp_ns: now,
        previous_hash: Hash32::ZERO,
        nonce: 0,
        hash: Hash32::ZERO,
        society_id: params.society_id.clone(),
        law_oracle_id: params.law_oracle_id.clone(),
        witnessed_by: vec![genesis_witness],
        transactions: vec![founding_tx],
        mrh: MrhSets {
            bound: vec![],
            paired: vec![],
            witnessing: vec![],
            broadcast: vec![params.society_id.clone()],
        },
    };
    block.hash = crypto::sha256_hash(&block.canonical_bytes()?);

    let mut writes = state.into_writes();
    writes.push((
        keys::block(0),
        Some(bincode_encode(&block)?),
    ));
    writes.push((
        keys::block_hash(&block.hash),
        Some(bincode_encode(&0u64)?),
    ));
    writes.push((keys::meta("chain_height"), Some(bincode_encode(&0u64)?)));
    store.apply_batch(writes)?;

    info!(society = %params.society_id, hash = %block.hash, "genesis applied");
    Ok(block)
}

pub(crate) fn bincode_encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}
