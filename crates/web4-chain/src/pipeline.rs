//! Transaction pipeline: syntactic validation, signature verification, and
//! routing to the owning keeper. Fail-fast: any error aborts the
//! transaction and the engine rolls the overlay back to its checkpoint, so
//! no partial state change is ever visible.

use tracing::warn;

use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::{Transaction, TxKind, TxPayload};
use web4_core::types::{Hash32, TimestampNs};
use web4_crypto as crypto;
use web4_lct::PairingStatus;
use web4_store::{keys, Overlay};

use crate::config::LedgerConfig;
use crate::society;

/// The block's own mining reward: an unsigned `atp_transfer` from the
/// society itself. At most one per block; exempt from signature and oracle
/// validation.
pub fn is_system_reward(tx: &Transaction, config: &LedgerConfig) -> bool {
    tx.signature.is_zero()
        && tx.from == config.society_id
        && matches!(tx.payload, TxPayload::AtpTransfer { ref purpose, .. } if purpose == "mining_reward")
}

/// Oracle decision re-emissions: `witness_validate` transactions authored
/// by the law oracle itself when it records the previous block's decisions.
pub fn is_oracle_reemission(tx: &Transaction, config: &LedgerConfig) -> bool {
    tx.signature.is_zero()
        && tx.from == config.law_oracle_id
        && matches!(tx.kind(), TxKind::WitnessValidate)
}

/// Syntactic and signature validation, before any keeper runs.
pub fn validate_transaction(
    tx: &Transaction,
    config: &LedgerConfig,
    now: TimestampNs,
) -> Result<(), LedgerError> {
    if let Some(deadline) = tx.deadline_ns {
        if now > deadline {
            return Err(LedgerError::Timeout);
        }
    }
    if tx.from.is_empty() {
        return Err(LedgerError::MissingField("from"));
    }
    if tx.id.is_zero() {
        return Err(LedgerError::MissingField("id"));
    }

    if is_system_reward(tx, config) || is_oracle_reemission(tx, config) {
        return Ok(());
    }

    let body = tx.signing_bytes()?;
    if crypto::tx_id_from_body(&body) != tx.id {
        return Err(LedgerError::InvalidSignature);
    }
    let public_key = tx
        .sender_public_key
        .as_ref()
        .ok_or(LedgerError::MissingField("sender_public_key"))?;
    crypto::verify(public_key, &body, &tx.signature).map_err(|_| {
        warn!(tx_id = %tx.id, from = %tx.from, "signature verification failed");
        LedgerError::InvalidSignature
    })
}

/// Route a validated transaction to its keeper and collect the events it
/// emits.
pub fn apply_transaction(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    tx: &Transaction,
    config: &LedgerConfig,
    now: TimestampNs,
) -> Result<(), LedgerError> {
    // Replay protection: the decision record doubles as the processed marker.
    if state.has(&keys::decision(&tx.id))? {
        return Err(LedgerError::DuplicateTransaction(tx.id));
    }

    match &tx.payload {
        // ── LCT lifecycle ────────────────────────────────────────────────────
        TxPayload::LctCreate {
            component_a,
            component_b,
            context,
            proxy,
        } => {
            // The returned key halves belong to the off-chain key holder;
            // dropping them here zeroizes the material.
            web4_lct::create_lct_relationship(
                state, events, &tx.from, *component_a, *component_b, context, *proxy, now,
            )?;
        }
        TxPayload::LctStatusUpdate {
            lct_id,
            new_status,
            reason,
        } => {
            let status = PairingStatus::parse(new_status)
                .ok_or(LedgerError::MissingField("new_status"))?;
            web4_lct::update_lct_status(state, events, lct_id, status, reason, now)?;
        }
        TxPayload::LctTerminate {
            lct_id,
            reason,
            notify_offline,
        } => {
            web4_lct::terminate_lct_relationship(
                state, events, lct_id, reason, &tx.from, *notify_offline, now,
            )?;
        }
        TxPayload::LctPairingInitiate {
            initiator_lct,
            target_lct,
            context,
            expires_at,
        } => {
            web4_lct::initiate_lct_mediated_pairing(
                state, events, &tx.from, initiator_lct, target_lct, context, *expires_at, now,
            )?;
        }
        TxPayload::LctPairingComplete {
            pairing_id,
            initiator_response,
            target_response,
            session_key_data,
        } => {
            // The encrypted half-packages go back to the parties through the
            // off-chain bridge; on-chain only the hashed session key stays.
            web4_lct::complete_lct_mediated_pairing(
                state,
                events,
                pairing_id,
                initiator_response,
                target_response,
                session_key_data,
                now,
            )?;
        }

        // ── Registry ─────────────────────────────────────────────────────────
        TxPayload::RegisterComponent {
            real_id,
            manufacturer_id,
            component_type,
        } => {
            web4_registry::register_anonymous_component(
                state, events, real_id, manufacturer_id, component_type, &tx.from, now,
            )?;
        }
        TxPayload::VerifyComponent { component_hash } => {
            web4_registry::verify_component(state, events, &tx.from, component_hash, now)?;
        }
        TxPayload::CreatePairingAuthorization {
            component_a,
            component_b,
            rule_hash,
            trust_score_requirement,
            level,
            expires_at,
        } => {
            web4_registry::create_pairing_authorization(
                state,
                events,
                *component_a,
                *component_b,
                *rule_hash,
                *trust_score_requirement,
                *level,
                *expires_at,
                now,
            )?;
        }
        TxPayload::UpdateAuthorization {
            component_a,
            component_b,
            trust_score_requirement,
            level,
            expires_at,
        } => {
            web4_registry::update_authorization(
                state,
                events,
                *component_a,
                *component_b,
                *trust_score_requirement,
                *level,
                *expires_at,
                now,
            )?;
        }
        TxPayload::RevokeAuthorization {
            component_a,
            component_b,
            reason,
        } => {
            web4_registry::revoke_authorization(
                state, events, *component_a, *component_b, reason, now,
            )?;
        }
        TxPayload::CreateAnonymousRevocationEvent {
            target_hash,
            revocation_type,
            urgency_level,
            reason_category,
        } => {
            web4_registry::create_anonymous_revocation_event(
                state,
                events,
                target_hash,
                *revocation_type,
                urgency_level,
                reason_category,
                &tx.from,
                now,
            )?;
        }

        // ── Trust tensors ────────────────────────────────────────────────────
        TxPayload::TrustTensorCreate {
            lct_id,
            tensor_type,
            context,
        } => {
            let lct = web4_lct::require_lct(state, lct_id)?;
            web4_trust::create_relationship_tensor(
                state,
                events,
                Some(*lct_id),
                lct.component_a_id,
                lct.component_b_id,
                *tensor_type,
                context,
                now,
            )?;
        }
        TxPayload::TrustScoreUpdate {
            tensor_id,
            score,
            witness,
            ..
        } => {
            web4_trust::update_tensor_score(state, events, *tensor_id, *score, witness, now)?;
        }

        // ── Energy cycle ─────────────────────────────────────────────────────
        TxPayload::EnergyOperationCreate {
            source_lct_id,
            destination_lct_id,
            amount,
            operation_type,
        } => {
            web4_energy::create_energy_operation(
                state,
                events,
                *source_lct_id,
                *destination_lct_id,
                *amount,
                *operation_type,
                now,
            )?;
        }
        TxPayload::EnergyTransferExecute {
            operation_id,
            amount,
            context,
        } => {
            web4_energy::execute_energy_transfer(
                state, events, operation_id, *amount, context, now,
            )?;
        }

        // ── Offline queue ────────────────────────────────────────────────────
        TxPayload::PairingQueueEnqueue {
            component_a,
            component_b,
            operational_context,
            proxy_id,
            priority,
            timeout_at,
        } => {
            web4_queue::enqueue_pairing_request(
                state,
                events,
                &tx.from,
                *component_a,
                *component_b,
                operational_context,
                *proxy_id,
                *priority,
                *timeout_at,
                now,
            )?;
        }
        TxPayload::PairingQueueCancel { request_id, reason } => {
            web4_queue::cancel_pairing_request(state, events, request_id, reason)?;
        }
        TxPayload::PairingQueueProcessOffline { component_id } => {
            web4_queue::process_offline_queue(state, events, component_id, now)?;
        }

        // ── ATP / ADP economy ────────────────────────────────────────────────
        TxPayload::AtpTransfer { amount, purpose } => {
            let to = tx.to.as_deref().ok_or(LedgerError::MissingField("to"))?;
            web4_energy::append_atp_entry(state, events, &tx.from, to, *amount, purpose, now)?;
        }
        TxPayload::AdpGenerate {
            task,
            atp_consumed,
            adp_generated,
            ..
        } => {
            // ATP is consumed back into the society pool; the minted ADP is
            // recorded via the event for downstream settlement.
            web4_energy::append_atp_entry(
                state,
                events,
                &tx.from,
                &config.society_id,
                *atp_consumed,
                &format!("adp:{task}"),
                now,
            )?;
            events.push(Event::AdpGenerate {
                task: task.clone(),
                atp_consumed: *atp_consumed,
                adp_generated: *adp_generated,
            });
        }

        // ── Society governance ───────────────────────────────────────────────
        TxPayload::SocietyCreate {
            society_id,
            name,
            law_oracle_id,
            constitution_hash,
        } => {
            society::create_society(
                state,
                society_id,
                name,
                law_oracle_id,
                *constitution_hash,
                &tx.from,
                now,
            )?;
        }
        TxPayload::SocietyJoin { society_id } => {
            society::join_society(state, society_id, &tx.from)?;
        }
        TxPayload::SocietyLeave { society_id } => {
            society::leave_society(state, society_id, &tx.from)?;
        }
        TxPayload::SocietyLaw {
            society_id,
            law_id,
            text_hash,
            supporters,
            economic_change,
        } => {
            society::enact_law(
                state,
                society_id,
                law_id,
                *text_hash,
                supporters.clone(),
                *economic_change,
                now,
            )?;
        }

        // ── Witnessing / roles ───────────────────────────────────────────────
        TxPayload::WitnessAction { .. } => {
            // Pure audit marker: the transaction's presence in the block is
            // the record.
        }
        TxPayload::WitnessValidate { .. } => {
            // Re-emission of a prior decision; the record was persisted when
            // the decision was made.
        }
        TxPayload::RoleCreate {
            role_type,
            holder,
            society_id,
            r6,
        } => {
            if Hash32::from_hex(holder).is_err() {
                return Err(LedgerError::InvalidHashWidth("holder"));
            }
            society::grant_role(state, *role_type, holder, society_id, r6.clone(), now)?;
        }
    }

    Ok(())
}
