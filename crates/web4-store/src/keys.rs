//! Storage key layout. One sled tree; logical collections are key-prefix
//! namespaces so a whole block commits in a single atomic batch.
//!
//! Layout:
//!   component/<hash>                       → Component
//!   verification/<hash>                    → ComponentVerification
//!   pairing_auth/<hashA>-<hashB>           → PairingAuthorization
//!   lct/<lct_id>                           → LinkedContextToken
//!   split/<pairing_id>                     → SplitKeyRecord
//!   challenge/<challenge_id>               → PairingChallenge
//!   tensor/<tensor_id>                     → TrustTensor
//!   tensor_rel/<A>-<B>/<type>/<context>    → tensor_id (relationship index)
//!   tensor_comp/<component>/<type>         → tensor_id (component index)
//!   energy_op/<op_id>                      → EnergyOperation
//!   atp/<seq u64 BE>                       → AtpEntry (replayed for balances)
//!   queue/<priority>/<enqueued_at u64 BE>/<req_id> → QueuedPairingRequest
//!   block/<index u64 BE>                   → Block
//!   block_hash/<hash>                      → index (secondary index)
//!   decision/<tx_id>                       → OracleDecisionRecord
//!   event/<block u64 BE>/<seq u64 BE>      → EventRecord
//!   society/<id>                           → Society
//!   role/<id>                              → RoleRecord
//!   meta/<name>                            → raw bytes

use web4_core::types::Hash32;

pub const COMPONENT: &str = "component/";
pub const VERIFICATION: &str = "verification/";
pub const PAIRING_AUTH: &str = "pairing_auth/";
pub const LCT: &str = "lct/";
pub const SPLIT: &str = "split/";
pub const CHALLENGE: &str = "challenge/";
pub const TENSOR: &str = "tensor/";
pub const TENSOR_REL: &str = "tensor_rel/";
pub const TENSOR_COMP: &str = "tensor_comp/";
pub const ENERGY_OP: &str = "energy_op/";
pub const ATP: &str = "atp/";
pub const QUEUE: &str = "queue/";
pub const BLOCK: &str = "block/";
pub const BLOCK_HASH: &str = "block_hash/";
pub const DECISION: &str = "decision/";
pub const EVENT: &str = "event/";
pub const SOCIETY: &str = "society/";
pub const ROLE: &str = "role/";
pub const META: &str = "meta/";

/// Every prefix, for audits that sweep the whole store.
pub const ALL_PREFIXES: &[&str] = &[
    COMPONENT,
    VERIFICATION,
    PAIRING_AUTH,
    LCT,
    SPLIT,
    CHALLENGE,
    TENSOR,
    TENSOR_REL,
    TENSOR_COMP,
    ENERGY_OP,
    ATP,
    QUEUE,
    BLOCK,
    BLOCK_HASH,
    DECISION,
    EVENT,
    SOCIETY,
    ROLE,
    META,
];

pub fn component(hash: &Hash32) -> Vec<u8> {
    format!("{COMPONENT}{hash}").into_bytes()
}

pub fn verification(hash: &Hash32) -> Vec<u8> {
    format!("{VERIFICATION}{hash}").into_bytes()
}

/// Pairing authorizations are keyed on the canonically ordered pair so both
/// lookup directions resolve to the same record.
pub fn pairing_auth(a: &Hash32, b: &Hash32) -> Vec<u8> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{PAIRING_AUTH}{lo}-{hi}").into_bytes()
}

pub fn lct(id: &Hash32) -> Vec<u8> {
    format!("{LCT}{id}").into_bytes()
}

pub fn split(pairing_id: &Hash32) -> Vec<u8> {
    format!("{SPLIT}{pairing_id}").into_bytes()
}

pub fn challenge(id: &Hash32) -> Vec<u8> {
    format!("{CHALLENGE}{id}").into_bytes()
}

pub fn tensor(id: &Hash32) -> Vec<u8> {
    format!("{TENSOR}{id}").into_bytes()
}

pub fn tensor_rel(a: &Hash32, b: &Hash32, tensor_type: &str, context: &str) -> Vec<u8> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{TENSOR_REL}{lo}-{hi}/{tensor_type}/{context}").into_bytes()
}

pub fn tensor_comp(component: &Hash32, tensor_type: &str) -> Vec<u8> {
    format!("{TENSOR_COMP}{component}/{tensor_type}").into_bytes()
}

pub fn energy_op(id: &Hash32) -> Vec<u8> {
    format!("{ENERGY_OP}{id}").into_bytes()
}

pub fn atp(seq: u64) -> Vec<u8> {
    let mut key = ATP.as_bytes().to_vec();
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

pub fn queue(priority_digit: u8, enqueued_at: u64, request_id: &Hash32) -> Vec<u8> {
    let mut key = QUEUE.as_bytes().to_vec();
    key.push(priority_digit);
    key.push(b'/');
    key.extend_from_slice(&enqueued_at.to_be_bytes());
    key.push(b'/');
    key.extend_from_slice(request_id.to_hex().as_bytes());
    key
}

pub fn block(index: u64) -> Vec<u8> {
    let mut key = BLOCK.as_bytes().to_vec();
    key.extend_from_slice(&index.to_be_bytes());
    key
}

pub fn block_hash(hash: &Hash32) -> Vec<u8> {
    format!("{BLOCK_HASH}{hash}").into_bytes()
}

pub fn decision(tx_id: &Hash32) -> Vec<u8> {
    format!("{DECISION}{tx_id}").into_bytes()
}

pub fn event(block_index: u64, seq: u64) -> Vec<u8> {
    let mut key = EVENT.as_bytes().to_vec();
    key.extend_from_slice(&block_index.to_be_bytes());
    key.push(b'/');
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

pub fn society(id: &str) -> Vec<u8> {
    format!("{SOCIETY}{id}").into_bytes()
}

pub fn role(id: &str) -> Vec<u8> {
    format!("{ROLE}{id}").into_bytes()
}

pub fn meta(name: &str) -> Vec<u8> {
    format!("{META}{name}").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_auth_is_order_independent() {
        let a = Hash32::from_bytes([1u8; 32]);
        let b = Hash32::from_bytes([2u8; 32]);
        assert_eq!(pairing_auth(&a, &b), pairing_auth(&b, &a));
    }

    #[test]
    fn block_keys_sort_by_index() {
        assert!(block(1) < block(2));
        assert!(block(255) < block(256));
    }

    #[test]
    fn queue_keys_sort_priority_then_fifo() {
        let id = Hash32::ZERO;
        // critical (digit '0') before high (digit '1') regardless of time
        assert!(queue(b'0', 999, &id) < queue(b'1', 1, &id));
        // FIFO within the same priority
        assert!(queue(b'2', 1, &id) < queue(b'2', 2, &id));
    }
}
