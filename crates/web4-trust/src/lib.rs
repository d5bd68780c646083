//! Trust tensor keeper: T3/V3 score storage, witness-corroborated updates,
//! and relationship trust calculation.

use serde::{Deserialize, Serialize};
use tracing::info;

use web4_core::constants::{
    TENSOR_DAMPENING_DELTA, TENSOR_DAMPENING_WITNESSES, TRUST_DEFAULT_NO_TENSOR,
};
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::TensorType;
use web4_core::types::{ComponentId, LctId, TensorId, TimestampNs};
use web4_crypto::sha256_concat;
use web4_store::{keys, Overlay};

// ── Records ──────────────────────────────────────────────────────────────────

/// One appended score update.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TensorUpdate {
    pub witness: String,
    pub prior_score: f64,
    pub new_score: f64,
    pub at: TimestampNs,
}

/// Per-relationship (or per-component) trust state.
///
/// `score` is the scalar in [0,1]; `axes` decompose it: T3 as
/// (talent, training, temperament), V3 as (valuation, veracity, validity).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrustTensor {
    pub tensor_id: TensorId,
    pub lct_id: Option<LctId>,
    pub component_a: ComponentId,
    pub component_b: ComponentId,
    pub tensor_type: TensorType,
    pub context: String,
    pub score: f64,
    pub axes: [f64; 3],
    pub version: u64,
    /// Distinct component ids that corroborated updates, in arrival order.
    pub witnesses: Vec<String>,
    pub history: Vec<TensorUpdate>,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
}

/// Result of a relationship trust calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrustAssessment {
    pub score: f64,
    /// True when the score came from a default or an uncorroborated tensor.
    pub no_witnesses: bool,
}

// ── Id derivation ────────────────────────────────────────────────────────────

fn tensor_id_for(
    a: &ComponentId,
    b: &ComponentId,
    tensor_type: TensorType,
    context: &str,
) -> TensorId {
    TensorId::from_bytes(sha256_concat(&[
        b"tensor:",
        a.as_bytes(),
        b.as_bytes(),
        tensor_type.as_str().as_bytes(),
        context.as_bytes(),
    ]))
}

fn canonical_pair(a: ComponentId, b: ComponentId) -> (ComponentId, ComponentId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Create a relationship tensor for (componentA, componentB, context).
/// Rejects if one already exists for the triple and type.
pub fn create_relationship_tensor(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    lct_id: Option<LctId>,
    component_a: ComponentId,
    component_b: ComponentId,
    tensor_type: TensorType,
    context: &str,
    now: TimestampNs,
) -> Result<TrustTensor, LedgerError> {
    let (a, b) = canonical_pair(component_a, component_b);
    let index_key = keys::tensor_rel(&a, &b, tensor_type.as_str(), context);
    if state.has(&index_key)? {
        let existing: TensorId = state.get(&index_key)?.unwrap_or_default();
        return Err(LedgerError::DuplicateTensor(existing));
    }

    let tensor_id = tensor_id_for(&a, &b, tensor_type, context);
    let tensor = TrustTensor {
        tensor_id,
        lct_id,
        component_a: a,
        component_b: b,
        tensor_type,
        context: context.to_string(),
        score: TRUST_DEFAULT_NO_TENSOR,
        axes: [TRUST_DEFAULT_NO_TENSOR; 3],
        version: 1,
        witnesses: Vec::new(),
        history: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    state.put(keys::tensor(&tensor_id), &tensor)?;
    state.put(index_key, &tensor_id)?;

    events.push(Event::TrustTensorCreated {
        tensor_id,
        lct_id: lct_id.unwrap_or_default(),
        tensor_type: tensor_type.as_str().to_string(),
        context: context.to_string(),
    });
    info!(tensor_id = %tensor_id, tensor_type = tensor_type.as_str(), "trust tensor created");
    Ok(tensor)
}

/// Create a component-level tensor (used as the geometric-mean fallback input
/// when no relationship tensor exists for a pair).
pub fn create_component_tensor(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    component: ComponentId,
    tensor_type: TensorType,
    context: &str,
    now: TimestampNs,
) -> Result<TrustTensor, LedgerError> {
    let index_key = keys::tensor_comp(&component, tensor_type.as_str());
    if state.has(&index_key)? {
        let existing: TensorId = state.get(&index_key)?.unwrap_or_default();
        return Err(LedgerError::DuplicateTensor(existing));
    }
    let tensor_id = TensorId::from_bytes(sha256_concat(&[
        b"tensor-comp:",
        component.as_bytes(),
        tensor_type.as_str().as_bytes(),
    ]));
    let tensor = TrustTensor {
        tensor_id,
        lct_id: None,
        component_a: component,
        component_b: component,
        tensor_type,
        context: context.to_string(),
        score: TRUST_DEFAULT_NO_TENSOR,
        axes: [TRUST_DEFAULT_NO_TENSOR; 3],
        version: 1,
        witnesses: Vec::new(),
        history: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    state.put(keys::tensor(&tensor_id), &tensor)?;
    state.put(index_key, &tensor_id)?;
    events.push(Event::TrustTensorCreated {
        tensor_id,
        lct_id: LctId::default(),
        tensor_type: tensor_type.as_str().to_string(),
        context: context.to_string(),
    });
    Ok(tensor)
}

/// Apply a witnessed score update.
///
/// The proposed score is clamped to [0,1] and folded into a witness-weighted
/// mean; until three distinct corroborators exist, the result may move at
/// most ±0.1 from the previous value per update.
pub fn update_tensor_score(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    tensor_id: TensorId,
    new_score: f64,
    witness: &str,
    now: TimestampNs,
) -> Result<TrustTensor, LedgerError> {
    if !new_score.is_finite() {
        return Err(LedgerError::ScoreOutOfRange(new_score));
    }
    let mut tensor: TrustTensor = state
        .get(&keys::tensor(&tensor_id))?
        .ok_or(LedgerError::TensorNotFound(tensor_id))?;

    let proposed = new_score.clamp(0.0, 1.0);
    let prior = tensor.score;
    let weight = tensor.witnesses.len() as f64;
    let mut next = (prior * weight + proposed) / (weight + 1.0);
    if tensor.witnesses.len() < TENSOR_DAMPENING_WITNESSES {
        next = next.clamp(prior - TENSOR_DAMPENING_DELTA, prior + TENSOR_DAMPENING_DELTA);
    }
    next = next.clamp(0.0, 1.0);

    tensor.history.push(TensorUpdate {
        witness: witness.to_string(),
        prior_score: prior,
        new_score: next,
        at: now,
    });
    if !tensor.witnesses.iter().any(|w| w == witness) {
        tensor.witnesses.push(witness.to_string());
    }
    tensor.score = next;
    tensor.axes = [next; 3];
    tensor.version += 1;
    tensor.updated_at = now;
    state.put(keys::tensor(&tensor_id), &tensor)?;

    events.push(Event::TensorScoreUpdated {
        tensor_id,
        old_score: prior,
        new_score: next,
        witness: witness.to_string(),
    });
    info!(tensor_id = %tensor_id, old = prior, new = next, "tensor score updated");
    Ok(tensor)
}

/// Relationship trust for (componentA, componentB, context).
///
/// Resolution order: relationship T3 tensor for the triple → geometric mean
/// of both components' latest T3 scores → 0.5 with `no_witnesses` set.
pub fn calculate_relationship_trust(
    state: &Overlay<'_>,
    component_a: &ComponentId,
    component_b: &ComponentId,
    context: &str,
) -> Result<TrustAssessment, LedgerError> {
    let (a, b) = canonical_pair(*component_a, *component_b);

    let rel_key = keys::tensor_rel(&a, &b, TensorType::T3.as_str(), context);
    if let Some(tensor_id) = state.get::<TensorId>(&rel_key)? {
        if let Some(tensor) = state.get::<TrustTensor>(&keys::tensor(&tensor_id))? {
            return Ok(TrustAssessment {
                score: tensor.score,
                no_witnesses: tensor.witnesses.is_empty(),
            });
        }
    }

    let comp_a = component_tensor(state, &a)?;
    let comp_b = component_tensor(state, &b)?;
    if let (Some(ta), Some(tb)) = (&comp_a, &comp_b) {
        return Ok(TrustAssessment {
            score: (ta.score * tb.score).sqrt(),
            no_witnesses: ta.witnesses.is_empty() && tb.witnesses.is_empty(),
        });
    }

    Ok(TrustAssessment {
        score: TRUST_DEFAULT_NO_TENSOR,
        no_witnesses: true,
    })
}

pub fn get_tensor(
    state: &Overlay<'_>,
    tensor_id: &TensorId,
) -> Result<Option<TrustTensor>, LedgerError> {
    state.get(&keys::tensor(tensor_id))
}

fn component_tensor(
    state: &Overlay<'_>,
    component: &ComponentId,
) -> Result<Option<TrustTensor>, LedgerError> {
    match state.get::<TensorId>(&keys::tensor_comp(component, TensorType::T3.as_str()))? {
        Some(id) => state.get(&keys::tensor(&id)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::types::Hash32;
    use web4_store::Store;

    const NOW: TimestampNs = 1_700_000_000_000_000_000;

    fn comp(tag: u8) -> ComponentId {
        Hash32::from_bytes([tag; 32])
    }

    #[test]
    fn create_rejects_duplicate_triple() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::T3, "energy", NOW,
        )
        .unwrap();
        // Same triple in reversed component order is still a duplicate.
        let err = create_relationship_tensor(
            &mut state, &mut events, None, comp(2), comp(1), TensorType::T3, "energy", NOW,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTensor(_)));
        // A different context is a different tensor.
        create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::T3, "telemetry", NOW,
        )
        .unwrap();
    }

    #[test]
    fn update_is_dampened_until_three_witnesses() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let tensor = create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::T3, "energy", NOW,
        )
        .unwrap();

        // 0.5 → proposes 1.0 but moves at most +0.1.
        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, 1.0, "w1", NOW)
            .unwrap();
        assert!((t.score - 0.6).abs() < 1e-9);

        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, 1.0, "w2", NOW)
            .unwrap();
        assert!((t.score - 0.7).abs() < 1e-9);

        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, 1.0, "w3", NOW)
            .unwrap();
        assert!((t.score - 0.8).abs() < 1e-9);
        assert_eq!(t.witnesses.len(), 3);

        // Three distinct corroborators: dampening lifted, weighted mean only.
        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, 1.0, "w4", NOW)
            .unwrap();
        assert!((t.score - (0.8 * 3.0 + 1.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn update_clamps_out_of_range_scores() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let tensor = create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::T3, "energy", NOW,
        )
        .unwrap();
        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, -4.0, "w1", NOW)
            .unwrap();
        assert!(t.score >= 0.4 - 1e-9);
        assert!(update_tensor_score(&mut state, &mut events, tensor.tensor_id, f64::NAN, "w1", NOW)
            .is_err());
    }

    #[test]
    fn history_records_every_update() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let tensor = create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::V3, "audit", NOW,
        )
        .unwrap();
        update_tensor_score(&mut state, &mut events, tensor.tensor_id, 0.55, "w1", NOW).unwrap();
        let t = update_tensor_score(&mut state, &mut events, tensor.tensor_id, 0.6, "w1", NOW + 1)
            .unwrap();
        assert_eq!(t.history.len(), 2);
        assert_eq!(t.witnesses.len(), 1, "same witness recorded once");
        assert_eq!(t.version, 3);
    }

    #[test]
    fn relationship_trust_resolution_order() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();

        // No tensors at all → default with no_witnesses.
        let t = calculate_relationship_trust(&state, &comp(1), &comp(2), "energy").unwrap();
        assert_eq!(t.score, 0.5);
        assert!(t.no_witnesses);

        // Component tensors only → geometric mean.
        let ca = create_component_tensor(
            &mut state, &mut events, comp(1), TensorType::T3, "self", NOW,
        )
        .unwrap();
        let cb = create_component_tensor(
            &mut state, &mut events, comp(2), TensorType::T3, "self", NOW,
        )
        .unwrap();
        for _ in 0..4 {
            update_tensor_score(&mut state, &mut events, ca.tensor_id, 0.9, "wa", NOW).unwrap();
        }
        update_tensor_score(&mut state, &mut events, cb.tensor_id, 0.6, "wb", NOW).unwrap();
        let t = calculate_relationship_trust(&state, &comp(1), &comp(2), "energy").unwrap();
        let sa = get_tensor(&state, &ca.tensor_id).unwrap().unwrap().score;
        let sb = get_tensor(&state, &cb.tensor_id).unwrap().unwrap().score;
        assert!((t.score - (sa * sb).sqrt()).abs() < 1e-9);
        assert!(!t.no_witnesses);

        // Relationship tensor wins over the fallback.
        let rel = create_relationship_tensor(
            &mut state, &mut events, None, comp(1), comp(2), TensorType::T3, "energy", NOW,
        )
        .unwrap();
        let t = calculate_relationship_trust(&state, &comp(2), &comp(1), "energy").unwrap();
        assert_eq!(t.score, rel.score);
    }
}
