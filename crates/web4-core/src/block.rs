use serde::{Deserialize, Serialize};

use crate::codec::{CanonicalReader, CanonicalWriter};
use crate::error::LedgerError;
use crate::transaction::{Transaction, Witness};
use crate::types::{Hash32, TimestampNs};

// ── MRH sets ─────────────────────────────────────────────────────────────────

/// Markov Relevancy Horizon: the four entity sets a block touches, derived
/// deterministically from its transactions.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MrhSets {
    pub bound: Vec<String>,
    pub paired: Vec<String>,
    pub witnessing: Vec<String>,
    pub broadcast: Vec<String>,
}

impl MrhSets {
    fn encode(&self, w: &mut CanonicalWriter) {
        for set in [&self.bound, &self.paired, &self.witnessing, &self.broadcast] {
            w.put_varuint(set.len() as u64);
            for entry in set {
                w.put_varstr(entry);
            }
        }
    }

    fn decode(r: &mut CanonicalReader<'_>) -> Result<Self, LedgerError> {
        let mut sets: [Vec<String>; 4] = Default::default();
        for set in sets.iter_mut() {
            let len = r.get_varuint()? as usize;
            for _ in 0..len {
                set.push(r.get_varstr()?);
            }
        }
        let [bound, paired, witnessing, broadcast] = sets;
        Ok(Self {
            bound,
            paired,
            witnessing,
            broadcast,
        })
    }
}

// ── Block ────────────────────────────────────────────────────────────────────

/// A sealed group of transactions.
///
/// `hash` is SHA-256 over [`Block::canonical_bytes`] (which never includes
/// the hash itself); the block engine searches `nonce` until the hex form of
/// that digest starts with `difficulty` zero digits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub index: u64,
    pub timestamp_ns: TimestampNs,
    pub previous_hash: Hash32,
    pub nonce: u64,
    pub hash: Hash32,
    pub society_id: String,
    pub law_oracle_id: String,
    pub witnessed_by: Vec<Witness>,
    pub transactions: Vec<Transaction>,
    pub mrh: MrhSets,
}

impl Block {
    /// Canonical byte encoding: the sole input to hashing and proof-of-work.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let mut w = CanonicalWriter::new();
        w.put_u64(self.index);
        w.put_u64(self.timestamp_ns);
        w.put_hash(&self.previous_hash);
        w.put_u64(self.nonce);
        w.put_varstr(&self.society_id);
        w.put_varstr(&self.law_oracle_id);
        w.put_varuint(self.witnessed_by.len() as u64);
        for witness in &self.witnessed_by {
            witness.encode(&mut w);
        }
        w.put_varuint(self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(&mut w)?;
        }
        self.mrh.encode(&mut w);
        Ok(w.into_bytes())
    }

    /// Decode a block from its canonical bytes. The `hash` field is left
    /// zeroed; callers recompute and compare it.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let mut r = CanonicalReader::new(bytes);
        let index = r.get_u64()?;
        let timestamp_ns = r.get_u64()?;
        let previous_hash = r.get_hash()?;
        let nonce = r.get_u64()?;
        let society_id = r.get_varstr()?;
        let law_oracle_id = r.get_varstr()?;
        let witness_count = r.get_varuint()? as usize;
        let mut witnessed_by = Vec::with_capacity(witness_count);
        for _ in 0..witness_count {
            witnessed_by.push(Witness::decode(&mut r)?);
        }
        let tx_count = r.get_varuint()? as usize;
        let mut transactions = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            transactions.push(Transaction::decode(&mut r)?);
        }
        let mrh = MrhSets::decode(&mut r)?;
        if !r.is_empty() {
            return Err(LedgerError::Serialization(
                "trailing bytes after canonical block".into(),
            ));
        }
        Ok(Self {
            index,
            timestamp_ns,
            previous_hash,
            nonce,
            hash: Hash32::ZERO,
            society_id,
            law_oracle_id,
            witnessed_by,
            transactions,
            mrh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxPayload;
    use crate::types::Signature64;

    fn sample_block() -> Block {
        let tx = Transaction {
            id: Hash32::from_bytes([9u8; 32]),
            timestamp_ns: 10,
            from: "society:test".into(),
            to: None,
            payload: TxPayload::WitnessAction {
                action: "observe".into(),
                subject: "block".into(),
            },
            sender_public_key: None,
            signature: Signature64::from_bytes([1u8; 64]),
            witnesses: vec![],
            deadline_ns: None,
        };
        Block {
            index: 1,
            timestamp_ns: 99,
            previous_hash: Hash32::from_bytes([4u8; 32]),
            nonce: 7,
            hash: Hash32::ZERO,
            society_id: "society:test".into(),
            law_oracle_id: "oracle:test".into(),
            witnessed_by: vec![Witness {
                lct_id: Hash32::from_bytes([5u8; 32]),
                signature: Signature64::from_bytes([6u8; 64]),
                timestamp_ns: 42,
                confidence: 1.0,
            }],
            transactions: vec![tx],
            mrh: MrhSets {
                bound: vec!["a".into()],
                paired: vec![],
                witnessing: vec!["w".into()],
                broadcast: vec![],
            },
        }
    }

    #[test]
    fn canonical_round_trip() {
        let block = sample_block();
        let bytes = block.canonical_bytes().unwrap();
        let back = Block::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(back.index, block.index);
        assert_eq!(back.previous_hash, block.previous_hash);
        assert_eq!(back.transactions, block.transactions);
        assert_eq!(back.mrh, block.mrh);
        // Re-encoding is byte-identical.
        assert_eq!(back.canonical_bytes().unwrap(), bytes);
    }

    #[test]
    fn canonical_bytes_exclude_hash() {
        let mut block = sample_block();
        let before = block.canonical_bytes().unwrap();
        block.hash = Hash32::from_bytes([0xff; 32]);
        assert_eq!(block.canonical_bytes().unwrap(), before);
    }

    #[test]
    fn nonce_changes_canonical_bytes() {
        let mut block = sample_block();
        let before = block.canonical_bytes().unwrap();
        block.nonce += 1;
        assert_ne!(block.canonical_bytes().unwrap(), before);
    }
}
