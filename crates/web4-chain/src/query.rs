//! Read-only query surface used by the CLI's `query <prefix> <key>`.
//! Decodes the stored record for the addressed prefix into JSON.

use serde_json::Value;

use web4_core::block::Block;
use web4_core::error::LedgerError;
use web4_core::types::Hash32;
use web4_store::{keys, Store};

use crate::engine::EventRecord;
use crate::oracle::OracleDecisionRecord;
use crate::society::{RoleRecord, Society};

fn to_json<T: serde::Serialize>(value: Option<T>) -> Result<Option<Value>, LedgerError> {
    value
        .map(|v| serde_json::to_value(v).map_err(|e| LedgerError::Serialization(e.to_string())))
        .transpose()
}

/// Look up one record by logical prefix and key, rendered as JSON.
pub fn query_json(store: &Store, prefix: &str, key: &str) -> Result<Option<Value>, LedgerError> {
    let hash = |field: &'static str| {
        Hash32::from_hex(key).map_err(|_| LedgerError::InvalidHashWidth(field))
    };
    match prefix {
        "component" => to_json(store.get::<web4_registry::Component>(&keys::component(&hash(
            "component",
        )?))?),
        "verification" => to_json(store.get::<Vec<web4_registry::ComponentVerification>>(
            &keys::verification(&hash("verification")?),
        )?),
        "pairing_auth" => {
            let (a, b) = key
                .split_once('-')
                .ok_or(LedgerError::MissingField("pairing key"))?;
            let a = Hash32::from_hex(a).map_err(|_| LedgerError::InvalidHashWidth("hashA"))?;
            let b = Hash32::from_hex(b).map_err(|_| LedgerError::InvalidHashWidth("hashB"))?;
            to_json(store.get::<web4_registry::PairingAuthorization>(&keys::pairing_auth(&a, &b))?)
        }
        "lct" => to_json(store.get::<web4_lct::LinkedContextToken>(&keys::lct(&hash("lct")?))?),
        "split" => to_json(store.get::<web4_lct::SplitKeyRecord>(&keys::split(&hash("split")?))?),
        "challenge" => to_json(
            store.get::<web4_lct::PairingChallenge>(&keys::challenge(&hash("challenge")?))?,
        ),
        "tensor" => {
            to_json(store.get::<web4_trust::TrustTensor>(&keys::tensor(&hash("tensor")?))?)
        }
        "energy_op" => to_json(
            store.get::<web4_energy::EnergyOperation>(&keys::energy_op(&hash("energy_op")?))?,
        ),
        "decision" => to_json(
            store.get::<OracleDecisionRecord>(&keys::decision(&hash("decision")?))?,
        ),
        "block" => {
            let index: u64 = key
                .parse()
                .map_err(|_| LedgerError::MissingField("block index"))?;
            to_json(store.get::<Block>(&keys::block(index))?)
        }
        "block_hash" => to_json(store.get::<u64>(&keys::block_hash(&hash("block_hash")?))?),
        "society" => to_json(store.get::<Society>(&keys::society(key))?),
        "role" => to_json(store.get::<RoleRecord>(&keys::role(key))?),
        "event" => {
            // key form: <block_index>/<seq>
            let (block, seq) = key
                .split_once('/')
                .ok_or(LedgerError::MissingField("event key"))?;
            let block: u64 = block
                .parse()
                .map_err(|_| LedgerError::MissingField("event block"))?;
            let seq: u64 = seq
                .parse()
                .map_err(|_| LedgerError::MissingField("event seq"))?;
            to_json(store.get::<EventRecord>(&keys::event(block, seq))?)
        }
        other => Err(LedgerError::Serialization(format!(
            "unknown query prefix: {other}"
        ))),
    }
}

/// All events of one block, in emission order.
pub fn block_events(store: &Store, index: u64) -> Result<Vec<EventRecord>, LedgerError> {
    let mut prefix = keys::EVENT.as_bytes().to_vec();
    prefix.extend_from_slice(&index.to_be_bytes());
    Ok(store
        .scan_prefix_as::<EventRecord>(&prefix)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Replay-derived ATP balance for an identity (query surface).
pub fn atp_balance(store: &Store, identity: &str) -> Result<f64, LedgerError> {
    let state = web4_store::Overlay::new(store);
    web4_energy::atp_balance(&state, identity)
}
