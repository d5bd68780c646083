//! Whole-chain validation: hash integrity, linkage, proof-of-work, witness
//! floors, and per-transaction oracle coverage.

use tracing::warn;

use web4_core::block::Block;
use web4_core::error::LedgerError;
use web4_core::types::TxId;
use web4_crypto as crypto;
use web4_store::{keys, Store};

use crate::config::LedgerConfig;
use crate::oracle::OracleDecisionRecord;
use crate::pipeline;

/// Re-derive every block hash and check linkage, proof-of-work, witness
/// presence, and per-transaction oracle coverage. Any mismatch anywhere
/// makes the whole chain invalid.
pub fn is_chain_valid(store: &Store, config: &LedgerConfig) -> Result<bool, LedgerError> {
    let blocks: Vec<(Vec<u8>, Block)> = store.scan_prefix_as(keys::BLOCK.as_bytes())?;
    if blocks.is_empty() {
        return Ok(false);
    }

    let mut previous: Option<&Block> = None;
    for (position, (_, block)) in blocks.iter().enumerate() {
        if block.index != position as u64 {
            warn!(index = block.index, position, "chain gap");
            return Ok(false);
        }

        let recomputed = crypto::sha256_hash(&block.canonical_bytes()?);
        if recomputed != block.hash {
            warn!(index = block.index, "block hash mismatch");
            return Ok(false);
        }
        if block.witnessed_by.is_empty() {
            warn!(index = block.index, "block has no witnesses");
            return Ok(false);
        }

        if let Some(prev) = previous {
            if block.previous_hash != prev.hash {
                warn!(index = block.index, "previous_hash linkage broken");
                return Ok(false);
            }
            if !crypto::hash_meets_difficulty(&block.hash, config.difficulty) {
                warn!(index = block.index, "proof-of-work below difficulty");
                return Ok(false);
            }
            if !transactions_validated(store, config, block)? {
                return Ok(false);
            }
        }
        // Index 0 is the genesis exemption: no PoW, no prior link, and its
        // founding transaction predates the oracle.

        previous = Some(block);
    }
    Ok(true)
}

fn transactions_validated(
    store: &Store,
    config: &LedgerConfig,
    block: &Block,
) -> Result<bool, LedgerError> {
    let mut rewards = 0usize;
    for tx in &block.transactions {
        if pipeline::is_system_reward(tx, config) {
            rewards += 1;
            if rewards > 1 {
                warn!(index = block.index, "more than one mining reward");
                return Ok(false);
            }
            continue;
        }
        if pipeline::is_oracle_reemission(tx, config) {
            continue;
        }

        // Body integrity.
        if crypto::tx_id_from_body(&tx.signing_bytes()?) != tx.id {
            warn!(index = block.index, tx_id = %tx.id, "transaction body tampered");
            return Ok(false);
        }
        // Witness floor per transaction type.
        let need = tx.kind().required_witnesses();
        if tx.witnesses.len() < need {
            warn!(index = block.index, tx_id = %tx.id, "transaction under-witnessed");
            return Ok(false);
        }
        // Oracle coverage: every sealed transaction carries an approval.
        if !decision_approves(store, &tx.id)? {
            warn!(index = block.index, tx_id = %tx.id, "transaction lacks oracle approval");
            return Ok(false);
        }
    }
    Ok(true)
}

fn decision_approves(store: &Store, tx_id: &TxId) -> Result<bool, LedgerError> {
    match store.get::<OracleDecisionRecord>(&keys::decision(tx_id))? {
        Some(record) => Ok(record.decision == "approve" || record.decision == "conditional"),
        None => Ok(false),
    }
}
