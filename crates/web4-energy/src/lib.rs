//! Energy cycle keeper: trust-gated ATP/ADP operations.
//!
//! Balances are never stored as integers; they derive from replaying the
//! ordered operation history under the `energy_op/` and `atp/` prefixes.

use serde::{Deserialize, Serialize};
use tracing::info;

use web4_core::constants::NS_PER_DAY;
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::EnergyOperationType;
use web4_core::types::{LctId, OperationId, TimestampNs};
use web4_crypto::sha256_concat;
use web4_lct::PairingStatus;
use web4_store::{keys, Overlay};

// ── Records ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnergyOperationStatus {
    Created,
    Executed,
}

/// One ATP→ADP operation between two LCTs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnergyOperation {
    pub operation_id: OperationId,
    pub source_lct_id: LctId,
    pub destination_lct_id: LctId,
    pub amount: f64,
    pub operation_type: EnergyOperationType,
    pub status: EnergyOperationStatus,
    pub created_at: TimestampNs,
    pub executed_at: Option<TimestampNs>,
}

/// Result of executing an energy transfer. Re-executing the same
/// `(operation_id, amount)` returns the original result unchanged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferResult {
    pub operation_id: OperationId,
    pub amount: f64,
    pub executed_at: TimestampNs,
}

/// Identity-level ATP ledger entry, replayed for balances and the law
/// oracle's daily accounting.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AtpEntry {
    pub seq: u64,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub purpose: String,
    pub at: TimestampNs,
}

// ── Operations ───────────────────────────────────────────────────────────────

fn source_relationship_trust(
    state: &Overlay<'_>,
    source: &web4_lct::LinkedContextToken,
) -> Result<f64, LedgerError> {
    let trust = web4_trust::calculate_relationship_trust(
        state,
        &source.component_a_id,
        &source.component_b_id,
        &source.operational_context,
    )?;
    Ok(trust.score)
}

/// Create an energy operation. Both LCTs must be active and the source
/// relationship's trust must clear the floor for the operation type.
pub fn create_energy_operation(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    source_lct_id: LctId,
    destination_lct_id: LctId,
    amount: f64,
    operation_type: EnergyOperationType,
    now: TimestampNs,
) -> Result<EnergyOperation, LedgerError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let source = web4_lct::require_lct(state, &source_lct_id)?;
    if source.pairing_status != PairingStatus::Active {
        return Err(LedgerError::LctNotActive(source_lct_id));
    }
    let destination = web4_lct::require_lct(state, &destination_lct_id)?;
    if destination.pairing_status != PairingStatus::Active {
        return Err(LedgerError::LctNotActive(destination_lct_id));
    }

    let trust = source_relationship_trust(state, &source)?;
    let floor = operation_type.trust_floor();
    if trust < floor {
        return Err(LedgerError::TrustScoreInsufficient {
            need: floor,
            got: trust,
        });
    }

    let operation_id = OperationId::from_bytes(sha256_concat(&[
        b"energy:",
        source_lct_id.as_bytes(),
        destination_lct_id.as_bytes(),
        &now.to_le_bytes(),
    ]));
    let operation = EnergyOperation {
        operation_id,
        source_lct_id,
        destination_lct_id,
        amount,
        operation_type,
        status: EnergyOperationStatus::Created,
        created_at: now,
        executed_at: None,
    };
    state.put(keys::energy_op(&operation_id), &operation)?;

    events.push(Event::EnergyOperationCreated {
        operation_id,
        source_lct_id,
        destination_lct_id,
        amount,
        operation_type: match operation_type {
            EnergyOperationType::Transfer => "transfer".into(),
            EnergyOperationType::EfficientTransfer => "efficient_transfer".into(),
        },
    });
    info!(operation_id = %operation_id, amount, "energy operation created");
    Ok(operation)
}

/// Execute an energy transfer, idempotent by `(operation_id, amount)`.
pub fn execute_energy_transfer(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    operation_id: &OperationId,
    amount: f64,
    _context: &str,
    now: TimestampNs,
) -> Result<TransferResult, LedgerError> {
    let mut operation: EnergyOperation = state
        .get(&keys::energy_op(operation_id))?
        .ok_or(LedgerError::OperationNotFound(*operation_id))?;

    if operation.status == EnergyOperationStatus::Executed {
        if (operation.amount - amount).abs() > f64::EPSILON {
            return Err(LedgerError::AmountMismatch {
                stored: operation.amount,
                got: amount,
            });
        }
        // Idempotent re-execution: the original result, no new state change.
        return Ok(TransferResult {
            operation_id: *operation_id,
            amount: operation.amount,
            executed_at: operation.executed_at.unwrap_or(operation.created_at),
        });
    }

    if (operation.amount - amount).abs() > f64::EPSILON {
        return Err(LedgerError::AmountMismatch {
            stored: operation.amount,
            got: amount,
        });
    }

    operation.status = EnergyOperationStatus::Executed;
    operation.executed_at = Some(now);
    state.put(keys::energy_op(operation_id), &operation)?;

    events.push(Event::EnergyTransfer {
        operation_id: *operation_id,
        amount,
    });
    info!(operation_id = %operation_id, amount, "energy transfer executed");
    Ok(TransferResult {
        operation_id: *operation_id,
        amount,
        executed_at: now,
    })
}

// ── Identity-level ATP ledger ────────────────────────────────────────────────

const ATP_SEQ_META: &str = "atp_seq";

/// Append an identity-level ATP movement (transfers, mining rewards, ADP
/// settlement) and emit its event.
pub fn append_atp_entry(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    from: &str,
    to: &str,
    amount: f64,
    purpose: &str,
    now: TimestampNs,
) -> Result<AtpEntry, LedgerError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let seq: u64 = state.get(&keys::meta(ATP_SEQ_META))?.unwrap_or(0);
    let entry = AtpEntry {
        seq,
        from: from.to_string(),
        to: to.to_string(),
        amount,
        purpose: purpose.to_string(),
        at: now,
    };
    state.put(keys::atp(seq), &entry)?;
    state.put(keys::meta(ATP_SEQ_META), &(seq + 1))?;

    events.push(Event::AtpTransfer {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        purpose: purpose.to_string(),
    });
    Ok(entry)
}

/// Identity ATP balance: replay of the full `atp/` prefix.
pub fn atp_balance(state: &Overlay<'_>, identity: &str) -> Result<f64, LedgerError> {
    let mut balance = 0.0;
    for (_, entry) in state.scan_prefix_as::<AtpEntry>(keys::ATP.as_bytes())? {
        if entry.to == identity {
            balance += entry.amount;
        }
        if entry.from == identity {
            balance -= entry.amount;
        }
    }
    Ok(balance)
}

/// ATP an identity has sent within the UTC calendar day containing `now`.
pub fn atp_sent_today(
    state: &Overlay<'_>,
    identity: &str,
    now: TimestampNs,
) -> Result<f64, LedgerError> {
    let day = now / NS_PER_DAY;
    let mut total = 0.0;
    for (_, entry) in state.scan_prefix_as::<AtpEntry>(keys::ATP.as_bytes())? {
        if entry.from == identity && entry.at / NS_PER_DAY == day {
            total += entry.amount;
        }
    }
    Ok(total)
}

/// LCT-level energy balance: replay of executed operations.
pub fn lct_energy_balance(state: &Overlay<'_>, lct_id: &LctId) -> Result<f64, LedgerError> {
    let mut balance = 0.0;
    for (_, op) in state.scan_prefix_as::<EnergyOperation>(keys::ENERGY_OP.as_bytes())? {
        if op.status != EnergyOperationStatus::Executed {
            continue;
        }
        if op.destination_lct_id == *lct_id {
            balance += op.amount;
        }
        if op.source_lct_id == *lct_id {
            balance -= op.amount;
        }
    }
    Ok(balance)
}
