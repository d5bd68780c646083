//! The block engine: single-writer transaction application and witnessed
//! block sealing.
//!
//! Exactly one `Ledger` value owns the mutable state path. Queries read the
//! committed store; a block's transactions apply to a write overlay that
//! flattens into one atomic batch at seal time, so concurrent readers see
//! the pre-block or post-block state and never a mix.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use web4_core::block::{Block, MrhSets};
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::{Transaction, TxPayload, Witness};
use web4_core::types::{Hash32, Signature64, TimestampNs, TxId};
use web4_crypto as crypto;
use web4_store::{keys, Overlay, Store};

use crate::config::LedgerConfig;
use crate::genesis::{self, GenesisParams};
use crate::oracle::{Decision, LawOracle, OracleDecisionRecord};
use crate::pipeline;
use crate::validation;

/// One persisted event, attributed to the transaction that emitted it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub seq: u64,
    pub tx_id: Option<TxId>,
    pub event: Event,
}

/// The single-writer ledger core.
pub struct Ledger {
    store: Store,
    config: LedgerConfig,
    pending: VecDeque<Transaction>,
    /// Oracle decisions from the previous block, awaiting re-emission as
    /// `witness_validate` transactions.
    reemit: Vec<Transaction>,
}

impl Ledger {
    /// Open the ledger, applying genesis when the store is fresh.
    pub fn open(
        store: Store,
        config: LedgerConfig,
        params: &GenesisParams,
    ) -> Result<Self, LedgerError> {
        if genesis::is_fresh(&store)? {
            genesis::apply_genesis(&store, params, &config)?;
        }
        Ok(Self {
            store,
            config,
            pending: VecDeque::new(),
            reemit: Vec::new(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Admission ────────────────────────────────────────────────────────────

    /// Admit a transaction to the pending buffer. Bounded: overflow returns
    /// `Backpressure` and the caller may retry after the next block.
    pub fn submit(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        if self.pending.len() >= self.config.max_pending {
            return Err(LedgerError::Backpressure);
        }
        self.pending.push_back(tx);
        Ok(())
    }

    // ── Chain queries ────────────────────────────────────────────────────────

    pub fn chain_height(&self) -> Result<u64, LedgerError> {
        self.store
            .get::<u64>(&keys::meta("chain_height"))?
            .ok_or_else(|| LedgerError::Storage("chain has no genesis".into()))
    }

    pub fn block_at(&self, index: u64) -> Result<Option<Block>, LedgerError> {
        self.store.get(&keys::block(index))
    }

    pub fn head(&self) -> Result<Block, LedgerError> {
        let height = self.chain_height()?;
        self.block_at(height)?
            .ok_or_else(|| LedgerError::Storage(format!("missing head block {height}")))
    }

    pub fn is_chain_valid(&self) -> Result<bool, LedgerError> {
        validation::is_chain_valid(&self.store, &self.config)
    }

    // ── Block production ─────────────────────────────────────────────────────

    /// Seal the pending transactions into the next block.
    ///
    /// Every transaction runs through the law oracle; violators are left out
    /// of the block with their rejection recorded (they may be re-submitted).
    /// The block commits with its state changes, events, decisions, and
    /// indexes in one atomic batch.
    pub fn mine_pending(
        &mut self,
        miner_id: &str,
        witnesses: Vec<Witness>,
        now: TimestampNs,
    ) -> Result<Option<Block>, LedgerError> {
        if self.pending.is_empty() && self.reemit.is_empty() {
            return Ok(None);
        }
        let mut queue: Vec<Transaction> = self.reemit.drain(..).collect();
        queue.extend(self.pending.drain(..));

        let previous = self.head()?;
        let oracle = LawOracle::new(&self.config);
        let mut state = Overlay::new(&self.store);
        let mut events: Vec<Event> = Vec::new();
        let mut attributions: Vec<(usize, TxId)> = Vec::new();
        let mut accepted: Vec<Transaction> = Vec::new();
        let mut decisions: Vec<OracleDecisionRecord> = Vec::new();

        for tx in queue {
            // Oracle re-emissions are ledger-internal audit records: they
            // carry a prior decision and are not themselves re-validated
            // (that would re-emit forever).
            if pipeline::is_oracle_reemission(&tx, &self.config) {
                accepted.push(tx);
                continue;
            }

            let events_before = events.len();
            let decision = match pipeline::validate_transaction(&tx, &self.config, now) {
                Ok(()) => oracle.validate(&state, &tx, now)?,
                Err(err) => Decision::Reject(err.to_string()),
            };

            let decision = if decision.is_approved() {
                let checkpoint = state.checkpoint();
                match pipeline::apply_transaction(&mut state, &mut events, &tx, &self.config, now)
                {
                    Ok(()) => decision,
                    Err(err) => {
                        state.restore(checkpoint);
                        events.truncate(events_before);
                        // A completion attempt against an expired challenge
                        // still moves the challenge and LCT to `expired`.
                        if matches!(err, LedgerError::ChallengeExpired) {
                            if let TxPayload::LctPairingComplete { pairing_id, .. } = &tx.payload {
                                web4_lct::expire_challenge(
                                    &mut state, &mut events, pairing_id, now,
                                )?;
                            }
                        }
                        Decision::Reject(err.to_string())
                    }
                }
            } else {
                decision
            };

            let record = OracleDecisionRecord::new(
                tx.id,
                &decision,
                &self.config.law_oracle_id,
                now,
            );
            // The first decision for a transaction id is authoritative; a
            // replay's rejection must not shadow the original approval.
            if !state.has(&keys::decision(&tx.id))? {
                state.put(keys::decision(&tx.id), &record)?;
            }
            events.push(Event::OracleDecision {
                tx_id: tx.id,
                decision: record.decision.clone(),
                reason: record.reason.clone(),
            });
            for seq in events_before..events.len() {
                attributions.push((seq, tx.id));
            }
            match &decision {
                Decision::Reject(reason) => {
                    warn!(tx_id = %tx.id, reason = %reason, "transaction rejected by law oracle");
                }
                _ => accepted.push(tx),
            }
            decisions.push(record);
        }

        // ── Block witnesses ──────────────────────────────────────────────────
        let mut witnessed_by = witnesses;
        if witnessed_by.is_empty() {
            witnessed_by.push(Witness {
                lct_id: crypto::anonymize(&format!("witness:{miner_id}")),
                signature: Signature64::ZERO,
                timestamp_ns: now,
                confidence: 1.0,
            });
        }

        // ── Mining reward ────────────────────────────────────────────────────
        let mut reward = Transaction {
            id: Hash32::ZERO,
            timestamp_ns: now,
            from: self.config.society_id.clone(),
            to: Some(miner_id.to_string()),
            payload: TxPayload::AtpTransfer {
                amount: self.config.economics.mining_reward,
                purpose: "mining_reward".into(),
            },
            sender_public_key: None,
            signature: Signature64::ZERO,
            witnesses: witnessed_by.clone(),
            deadline_ns: None,
        };
        reward.id = crypto::tx_id_from_body(&reward.signing_bytes()?);
        let events_before = events.len();
        pipeline::apply_transaction(&mut state, &mut events, &reward, &self.config, now)?;
        for seq in events_before..events.len() {
            attributions.push((seq, reward.id));
        }
        accepted.push(reward);

        // ── Assemble and seal ────────────────────────────────────────────────
        let index = previous.index + 1;
        let mut block = Block {
            index,
            timestamp_ns: now,
            previous_hash: previous.hash,
            nonce: 0,
            hash: Hash32::ZERO,
            society_id: self.config.society_id.clone(),
            law_oracle_id: self.config.law_oracle_id.clone(),
            witnessed_by,
            transactions: accepted,
            mrh: MrhSets::default(),
        };
        block.mrh = derive_mrh(&block.transactions);

        // Proof-of-work: bump the nonce until the hash clears the difficulty.
        loop {
            let hash = crypto::sha256_hash(&block.canonical_bytes()?);
            if crypto::hash_meets_difficulty(&hash, self.config.difficulty) {
                block.hash = hash;
                break;
            }
            block.nonce += 1;
        }

        events.push(Event::BlockMined {
            index,
            hash: block.hash,
            tx_count: block.transactions.len() as u64,
            miner: miner_id.to_string(),
        });

        // ── One atomic batch: state, block, indexes, events ──────────────────
        let attribution_of = |seq: usize| -> Option<TxId> {
            attributions
                .iter()
                .find(|(s, _)| *s == seq)
                .map(|(_, id)| *id)
        };
        let mut writes = state.into_writes();
        for (seq, event) in events.iter().enumerate() {
            let record = EventRecord {
                seq: seq as u64,
                tx_id: attribution_of(seq),
                event: event.clone(),
            };
            writes.push((
                keys::event(index, seq as u64),
                Some(genesis::bincode_encode(&record)?),
            ));
        }
        writes.push((keys::block(index), Some(genesis::bincode_encode(&block)?)));
        writes.push((
            keys::block_hash(&block.hash),
            Some(genesis::bincode_encode(&index)?),
        ));
        writes.push((
            keys::meta("chain_height"),
            Some(genesis::bincode_encode(&index)?),
        ));
        self.store.apply_batch(writes)?;
        self.store.flush()?;

        // Queue decision re-emissions for the next block.
        self.reemit = decisions
            .iter()
            .map(|record| self.reemission_tx(record))
            .collect::<Result<_, _>>()?;

        info!(index, hash = %block.hash, txs = block.transactions.len(), "block mined");
        Ok(Some(block))
    }

    fn reemission_tx(&self, record: &OracleDecisionRecord) -> Result<Transaction, LedgerError> {
        let mut tx = Transaction {
            id: Hash32::ZERO,
            timestamp_ns: record.decided_at,
            from: self.config.law_oracle_id.clone(),
            to: None,
            payload: TxPayload::WitnessValidate {
                decision_id: record.decision_id,
                subject_tx: record.subject_tx,
                decision: record.decision.clone(),
                reason: record.reason.clone(),
            },
            sender_public_key: None,
            signature: Signature64::ZERO,
            witnesses: vec![],
            deadline_ns: None,
        };
        tx.id = crypto::tx_id_from_body(&tx.signing_bytes()?);
        Ok(tx)
    }
}

// ── MRH derivation ───────────────────────────────────────────────────────────

/// Derive the block's Markov Relevancy Horizon from its transactions:
/// bound = LCT ids touched, paired = component hashes touched,
/// witnessing = witness LCTs, broadcast = society-level identities.
pub fn derive_mrh(transactions: &[Transaction]) -> MrhSets {
    let mut bound = BTreeSet::new();
    let mut paired = BTreeSet::new();
    let mut witnessing = BTreeSet::new();
    let mut broadcast = BTreeSet::new();

    for tx in transactions {
        for witness in &tx.witnesses {
            witnessing.insert(witness.lct_id.to_hex());
        }
        match &tx.payload {
            TxPayload::LctCreate {
                component_a,
                component_b,
                proxy,
                ..
            } => {
                paired.insert(component_a.to_hex());
                paired.insert(component_b.to_hex());
                if let Some(proxy) = proxy {
                    paired.insert(proxy.to_hex());
                }
            }
            TxPayload::LctStatusUpdate { lct_id, .. }
            | TxPayload::LctTerminate { lct_id, .. }
            | TxPayload::TrustTensorCreate { lct_id, .. } => {
                bound.insert(lct_id.to_hex());
            }
            TxPayload::LctPairingInitiate {
                initiator_lct,
                target_lct,
                ..
            } => {
                bound.insert(initiator_lct.to_hex());
                bound.insert(target_lct.to_hex());
            }
            TxPayload::RegisterComponent { .. } => {}
            TxPayload::VerifyComponent { component_hash } => {
                paired.insert(component_hash.to_hex());
            }
            TxPayload::CreatePairingAuthorization {
                component_a,
                component_b,
                ..
            }
            | TxPayload::UpdateAuthorization {
                component_a,
                component_b,
                ..
            }
            | TxPayload::RevokeAuthorization {
                component_a,
                component_b,
                ..
            }
            | TxPayload::PairingQueueEnqueue {
                component_a,
                component_b,
                ..
            } => {
                paired.insert(component_a.to_hex());
                paired.insert(component_b.to_hex());
            }
            TxPayload::CreateAnonymousRevocationEvent { target_hash, .. } => {
                broadcast.insert(target_hash.to_hex());
            }
            TxPayload::EnergyOperationCreate {
                source_lct_id,
                destination_lct_id,
                ..
            } => {
                bound.insert(source_lct_id.to_hex());
                bound.insert(destination_lct_id.to_hex());
            }
            TxPayload::SocietyCreate { society_id, .. }
            | TxPayload::SocietyJoin { society_id }
            | TxPayload::SocietyLeave { society_id }
            | TxPayload::SocietyLaw { society_id, .. } => {
                broadcast.insert(society_id.clone());
            }
            TxPayload::AtpTransfer { .. } => {
                if let Some(to) = &tx.to {
                    broadcast.insert(to.clone());
                }
            }
            _ => {}
        }
    }

    MrhSets {
        bound: bound.into_iter().collect(),
        paired: paired.into_iter().collect(),
        witnessing: witnessing.into_iter().collect(),
        broadcast: broadcast.into_iter().collect(),
    }
}
