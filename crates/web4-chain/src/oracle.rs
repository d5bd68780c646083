//! The law oracle: every transaction is validated against society law
//! before it may enter a block. The oracle's decision record is persisted
//! and re-emitted as a `witness_validate` transaction in the next block.

use serde::{Deserialize, Serialize};
use tracing::warn;

use web4_core::constants::{QUORUM_ECONOMIC, QUORUM_LAW_UPDATE};
use web4_core::error::LedgerError;
use web4_core::transaction::{RoleType, Transaction, TxKind, TxPayload};
use web4_core::types::{Hash32, TimestampNs, TxId};
use web4_crypto::sha256_concat;
use web4_store::Overlay;

use crate::config::LedgerConfig;
use crate::society;

// ── Decision ─────────────────────────────────────────────────────────────────

/// Outcome of a law-oracle validation.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Approve,
    Reject(String),
    /// Approved subject to conditions; the conditions ride along in the
    /// persisted decision record.
    Conditional(Vec<String>),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        !matches!(self, Decision::Reject(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject(_) => "reject",
            Decision::Conditional(_) => "conditional",
        }
    }
}

/// Persisted decision record (prefix `decision/<tx_id>`). Doubles as the
/// processed-transaction marker for replay protection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OracleDecisionRecord {
    pub decision_id: Hash32,
    pub subject_tx: TxId,
    pub decision: String,
    pub reason: String,
    pub conditions: Vec<String>,
    pub law_oracle_id: String,
    pub decided_at: TimestampNs,
}

impl OracleDecisionRecord {
    pub fn new(
        subject_tx: TxId,
        decision: &Decision,
        law_oracle_id: &str,
        now: TimestampNs,
    ) -> Self {
        let (reason, conditions) = match decision {
            Decision::Approve => (String::new(), Vec::new()),
            Decision::Reject(reason) => (reason.clone(), Vec::new()),
            Decision::Conditional(conditions) => (String::new(), conditions.clone()),
        };
        Self {
            decision_id: Hash32::from_bytes(sha256_concat(&[
                b"decision:",
                subject_tx.as_bytes(),
                &now.to_le_bytes(),
            ])),
            subject_tx,
            decision: decision.as_str().to_string(),
            reason,
            conditions,
            law_oracle_id: law_oracle_id.to_string(),
            decided_at: now,
        }
    }
}

// ── Oracle ───────────────────────────────────────────────────────────────────

pub struct LawOracle<'a> {
    config: &'a LedgerConfig,
}

impl<'a> LawOracle<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        Self { config }
    }

    /// Validate one transaction against society law. Read-only: the caller
    /// records the decision and applies or drops the transaction.
    pub fn validate(
        &self,
        state: &Overlay<'_>,
        tx: &Transaction,
        now: TimestampNs,
    ) -> Result<Decision, LedgerError> {
        let kind = tx.kind();

        // ── Witness floor ─────────────────────────────────────────────────────
        let need = kind.required_witnesses();
        if tx.witnesses.len() < need {
            return Ok(Decision::Reject(format!(
                "Insufficient witnesses: {}/{}",
                tx.witnesses.len(),
                need
            )));
        }

        // ── Role-category rules ──────────────────────────────────────────────
        if let Some(decision) = self.check_origin_rules(state, tx)? {
            return Ok(decision);
        }

        // ── Economic rules ───────────────────────────────────────────────────
        if let Some(decision) = self.check_economic_rules(state, tx, now)? {
            return Ok(decision);
        }

        // ── Governance rules ─────────────────────────────────────────────────
        if let TxPayload::SocietyLaw {
            society_id,
            supporters,
            economic_change,
            ..
        } = &tx.payload
        {
            let society = match society::get_society(state, society_id)? {
                Some(s) => s,
                None => return Ok(Decision::Reject(format!("unknown society {society_id}"))),
            };
            let total = society.citizens.len().max(1);
            let quorum = if *economic_change {
                QUORUM_ECONOMIC
            } else {
                QUORUM_LAW_UPDATE
            };
            let support = supporters.len() as f64 / total as f64;
            if support < quorum {
                return Ok(Decision::Reject(format!(
                    "quorum not met: {}/{} supporters below {:.0}%",
                    supporters.len(),
                    total,
                    quorum * 100.0
                )));
            }
            for veto in &society.veto_entities {
                if !supporters.iter().any(|s| s == veto) {
                    return Ok(Decision::Reject(format!(
                        "veto entity absent from supporters: {veto}"
                    )));
                }
            }
        }

        // ── Compliance delegate for role transactions ────────────────────────
        if matches!(kind, TxKind::RoleCreate) {
            if let Some(decision) = check_web4_compliance(tx)? {
                return Ok(decision);
            }
        }

        // ── Conditional path: witnessing by unroled identities ───────────────
        if matches!(kind, TxKind::WitnessAction)
            && society::get_role(state, &tx.from)?.is_none()
        {
            return Ok(Decision::Conditional(vec![
                "register_witness_role".to_string()
            ]));
        }

        Ok(Decision::Approve)
    }

    fn check_origin_rules(
        &self,
        state: &Overlay<'_>,
        tx: &Transaction,
    ) -> Result<Option<Decision>, LedgerError> {
        match &tx.payload {
            // A society may only be created by genesis or by itself.
            TxPayload::SocietyCreate { society_id, .. } => {
                if tx.from != "genesis" && tx.from != *society_id {
                    return Ok(Some(Decision::Reject(format!(
                        "society_create not permitted from {}",
                        tx.from
                    ))));
                }
            }
            // Roles need sign-off from the orchestrator and a queen.
            TxPayload::RoleCreate { .. } => {
                if !society::witness_holds_role(state, &tx.witnesses, RoleType::Orchestrator)? {
                    return Ok(Some(Decision::Reject(
                        "required approver missing: orchestrator".into(),
                    )));
                }
                if !society::witness_holds_role(state, &tx.witnesses, RoleType::Queen)? {
                    return Ok(Some(Decision::Reject(
                        "required approver missing: queen".into(),
                    )));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn check_economic_rules(
        &self,
        state: &Overlay<'_>,
        tx: &Transaction,
        now: TimestampNs,
    ) -> Result<Option<Decision>, LedgerError> {
        let economics = &self.config.economics;
        match &tx.payload {
            TxPayload::AtpTransfer { amount, purpose } => {
                if *amount > economics.atp_max_amount {
                    return Ok(Some(Decision::Reject(format!(
                        "atp_transfer amount {amount} exceeds max {}",
                        economics.atp_max_amount
                    ))));
                }
                if purpose == "witness_reward" && *amount < economics.witness_reward_min {
                    return Ok(Some(Decision::Reject(format!(
                        "witness reward {amount} below minimum {}",
                        economics.witness_reward_min
                    ))));
                }
                let sent = web4_energy::atp_sent_today(state, &tx.from, now)?;
                if sent + *amount > economics.atp_daily_max {
                    warn!(from = %tx.from, sent, amount, "daily ATP ceiling reached");
                    return Ok(Some(Decision::Reject(format!(
                        "daily ATP max exceeded: {:.1} + {amount} > {}",
                        sent, economics.atp_daily_max
                    ))));
                }
            }
            TxPayload::AdpGenerate {
                atp_consumed,
                adp_generated,
                ..
            } => {
                if *atp_consumed <= 0.0 {
                    return Ok(Some(Decision::Reject(
                        "adp_generate requires positive atp_consumed".into(),
                    )));
                }
                if adp_generated / atp_consumed > economics.adp_ratio_max {
                    return Ok(Some(Decision::Reject(format!(
                        "adp/atp ratio {:.2} exceeds max {:.2}",
                        adp_generated / atp_consumed,
                        economics.adp_ratio_max
                    ))));
                }
            }
            _ => {}
        }
        Ok(None)
    }
}

// ── Web4 compliance delegate ─────────────────────────────────────────────────

/// Structural compliance for role transactions: identity format, signature
/// presence, witness floor, R6 completeness.
pub fn check_web4_compliance(tx: &Transaction) -> Result<Option<Decision>, LedgerError> {
    if tx.from.is_empty() {
        return Ok(Some(Decision::Reject("missing from identity".into())));
    }
    if tx.signature.is_zero() {
        return Ok(Some(Decision::Reject("missing signature".into())));
    }
    if tx.witnesses.len() < tx.kind().required_witnesses() {
        return Ok(Some(Decision::Reject(format!(
            "Insufficient witnesses: {}/{}",
            tx.witnesses.len(),
            tx.kind().required_witnesses()
        ))));
    }
    if let TxPayload::RoleCreate { r6, holder, .. } = &tx.payload {
        if Hash32::from_hex(holder).is_err() {
            return Ok(Some(Decision::Reject(
                "role holder is not a 64-hex identity".into(),
            )));
        }
        if !r6.is_complete() {
            return Ok(Some(Decision::Reject(
                "R6 frame incomplete: all six of rules/roles/request/reference/resource/result are required"
                    .into(),
            )));
        }
    }
    Ok(None)
}
