//! Component registry keeper: anonymous registration, verification,
//! pairing authorization lifecycle, and revocation events.

pub mod records;

use tracing::{info, warn};

use web4_core::constants::AUTHORIZATION_DEFAULT_TTL_NS;
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::{AuthorizationLevel, RevocationType};
use web4_core::types::{ComponentId, Hash32, LctId, TimestampNs};
use web4_crypto::anonymize;
use web4_store::{keys, Overlay};

pub use records::{
    AuthorizationStatus, Component, ComponentStatus, ComponentVerification, PairingAuthorization,
    PairingCheck,
};

fn canonical_pair(a: ComponentId, b: ComponentId) -> (ComponentId, ComponentId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ── Lookup helpers ───────────────────────────────────────────────────────────

pub fn get_component(
    state: &Overlay<'_>,
    hash: &ComponentId,
) -> Result<Option<Component>, LedgerError> {
    state.get(&keys::component(hash))
}

/// Fetch a component and require `status = active`.
pub fn require_active(
    state: &Overlay<'_>,
    hash: &ComponentId,
) -> Result<Component, LedgerError> {
    let component =
        get_component(state, hash)?.ok_or(LedgerError::ComponentNotFound(*hash))?;
    if component.status != ComponentStatus::Active {
        return Err(LedgerError::ComponentUnavailable(
            *hash,
            component.status.as_str().to_string(),
        ));
    }
    Ok(component)
}

/// Record an LCT id in a component's relationship set.
pub fn add_relationship(
    state: &mut Overlay<'_>,
    hash: &ComponentId,
    lct_id: LctId,
) -> Result<(), LedgerError> {
    let mut component =
        get_component(state, hash)?.ok_or(LedgerError::ComponentNotFound(*hash))?;
    if !component.relationship_hashes.contains(&lct_id) {
        component.relationship_hashes.push(lct_id);
        state.put(keys::component(hash), &component)?;
    }
    Ok(())
}

// ── Registration ─────────────────────────────────────────────────────────────

/// Register a component anonymously: every raw identifier is hashed before
/// storage, and only the hashes persist.
pub fn register_anonymous_component(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    real_id: &str,
    manufacturer_id: &str,
    component_type: &str,
    trust_anchor: &str,
    now: TimestampNs,
) -> Result<Component, LedgerError> {
    if real_id.is_empty() {
        return Err(LedgerError::MissingField("real_id"));
    }
    if manufacturer_id.is_empty() {
        return Err(LedgerError::MissingField("manufacturer_id"));
    }

    let component_id = anonymize(real_id);
    if state.has(&keys::component(&component_id))? {
        return Err(LedgerError::DuplicateComponent(component_id));
    }

    let component = Component {
        component_id,
        manufacturer_hash: anonymize(manufacturer_id),
        category_hash: anonymize(component_type),
        authorization_rules_hash: anonymize("default_rules"),
        status: ComponentStatus::Active,
        trust_anchor: trust_anchor.to_string(),
        registered_at: now,
        last_verified_at: None,
        relationship_hashes: Vec::new(),
    };
    state.put(keys::component(&component_id), &component)?;

    events.push(Event::AnonymousComponentRegistered {
        component_hash: component_id,
        manufacturer_hash: component.manufacturer_hash,
        category_hash: component.category_hash,
    });
    info!(component = %component_id, "anonymous component registered");
    Ok(component)
}

// ── Verification ─────────────────────────────────────────────────────────────

fn append_verification(
    state: &mut Overlay<'_>,
    entry: ComponentVerification,
) -> Result<(), LedgerError> {
    let key = keys::verification(&entry.component_hash);
    let mut log: Vec<ComponentVerification> = state.get(&key)?.unwrap_or_default();
    log.push(entry);
    state.put(key, &log)
}

/// Verify a component. Active components get `last_verified_at` refreshed
/// and sanitized (hash-only) metadata back; inactive ones fail with an
/// empty payload and an audit event.
pub fn verify_component(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    verifier: &str,
    component_hash: &ComponentId,
    now: TimestampNs,
) -> Result<(bool, String), LedgerError> {
    let mut component = get_component(state, component_hash)?
        .ok_or(LedgerError::ComponentNotFound(*component_hash))?;

    if component.status != ComponentStatus::Active {
        append_verification(
            state,
            ComponentVerification {
                component_hash: *component_hash,
                verifier: verifier.to_string(),
                result: "failed_inactive".into(),
                verified_at: now,
                notes: format!("component is {}", component.status.as_str()),
            },
        )?;
        events.push(Event::ComponentVerified {
            component_hash: *component_hash,
            verifier: verifier.to_string(),
            status: "failed_inactive".into(),
        });
        warn!(component = %component_hash, "verification failed: inactive");
        return Ok((false, String::new()));
    }

    component.last_verified_at = Some(now);
    state.put(keys::component(component_hash), &component)?;
    append_verification(
        state,
        ComponentVerification {
            component_hash: *component_hash,
            verifier: verifier.to_string(),
            result: "verified".into(),
            verified_at: now,
            notes: String::new(),
        },
    )?;

    let sanitized = serde_json::json!({
        "component_hash": component_hash.to_hex(),
        "manufacturer_hash": component.manufacturer_hash.to_hex(),
        "category_hash": component.category_hash.to_hex(),
        "status": component.status.as_str(),
    })
    .to_string();

    events.push(Event::ComponentVerified {
        component_hash: *component_hash,
        verifier: verifier.to_string(),
        status: "verified".into(),
    });
    Ok((true, sanitized))
}

// ── Pairing authorization lifecycle ──────────────────────────────────────────

pub fn get_authorization(
    state: &Overlay<'_>,
    a: &ComponentId,
    b: &ComponentId,
) -> Result<Option<PairingAuthorization>, LedgerError> {
    state.get(&keys::pairing_auth(a, b))
}

/// Create a pairing authorization. Both components must be active and the
/// current relationship trust must clear the level's floor.
pub fn create_pairing_authorization(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    component_a: ComponentId,
    component_b: ComponentId,
    rule_hash: Hash32,
    trust_score_requirement: f64,
    level: AuthorizationLevel,
    expires_at: Option<TimestampNs>,
    now: TimestampNs,
) -> Result<PairingAuthorization, LedgerError> {
    if !(0.0..=1.0).contains(&trust_score_requirement) {
        return Err(LedgerError::ScoreOutOfRange(trust_score_requirement));
    }
    let (a, b) = canonical_pair(component_a, component_b);
    require_active(state, &a)?;
    require_active(state, &b)?;

    if let Some(existing) = get_authorization(state, &a, &b)? {
        // Revocation is final; an active record must be updated, not recreated.
        return match existing.status {
            AuthorizationStatus::Revoked => Err(LedgerError::AuthorizationRevoked),
            AuthorizationStatus::Active => Err(LedgerError::DuplicateAuthorization(a, b)),
        };
    }

    let trust = web4_trust::calculate_relationship_trust(state, &a, &b, "pairing")?;
    let floor = level.trust_floor();
    if trust.score < floor {
        return Err(LedgerError::TrustScoreInsufficient {
            need: floor,
            got: trust.score,
        });
    }

    let auth = PairingAuthorization {
        component_a: a,
        component_b: b,
        rule_hash,
        authorization_level: level,
        trust_score_requirement,
        status: AuthorizationStatus::Active,
        version: 1,
        created_at: now,
        updated_at: now,
        expires_at: expires_at.unwrap_or(now + AUTHORIZATION_DEFAULT_TTL_NS),
    };
    state.put(keys::pairing_auth(&a, &b), &auth)?;

    events.push(Event::AuthorizationCreated {
        component_a: a,
        component_b: b,
        version: auth.version,
    });
    events.push(Event::AnonymousPairingAuthorized {
        component_a: a,
        component_b: b,
        level: level.as_str().to_string(),
    });
    info!(a = %a, b = %b, level = level.as_str(), "pairing authorization created");
    Ok(auth)
}

/// Update an authorization's requirement, level, or expiry. Each update
/// bumps `version` and refreshes `updated_at`.
pub fn update_authorization(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    component_a: ComponentId,
    component_b: ComponentId,
    trust_score_requirement: Option<f64>,
    level: Option<AuthorizationLevel>,
    expires_at: Option<TimestampNs>,
    now: TimestampNs,
) -> Result<PairingAuthorization, LedgerError> {
    let (a, b) = canonical_pair(component_a, component_b);
    let mut auth = get_authorization(state, &a, &b)?
        .ok_or(LedgerError::AuthorizationNotFound(a, b))?;
    if auth.status == AuthorizationStatus::Revoked {
        return Err(LedgerError::AuthorizationRevoked);
    }
    if let Some(req) = trust_score_requirement {
        if !(0.0..=1.0).contains(&req) {
            return Err(LedgerError::ScoreOutOfRange(req));
        }
        auth.trust_score_requirement = req;
    }
    if let Some(level) = level {
        auth.authorization_level = level;
    }
    if let Some(expiry) = expires_at {
        auth.expires_at = expiry;
    }
    auth.version += 1;
    auth.updated_at = now;
    state.put(keys::pairing_auth(&a, &b), &auth)?;

    events.push(Event::AuthorizationUpdated {
        component_a: a,
        component_b: b,
        version: auth.version,
    });
    Ok(auth)
}

/// Revoke an authorization. Final: the record stays, no resurrection.
pub fn revoke_authorization(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    component_a: ComponentId,
    component_b: ComponentId,
    reason: &str,
    now: TimestampNs,
) -> Result<(), LedgerError> {
    let (a, b) = canonical_pair(component_a, component_b);
    let mut auth = get_authorization(state, &a, &b)?
        .ok_or(LedgerError::AuthorizationNotFound(a, b))?;
    if auth.status == AuthorizationStatus::Revoked {
        return Err(LedgerError::AuthorizationRevoked);
    }
    auth.status = AuthorizationStatus::Revoked;
    auth.version += 1;
    auth.updated_at = now;
    state.put(keys::pairing_auth(&a, &b), &auth)?;

    events.push(Event::AuthorizationRevoked {
        component_a: a,
        component_b: b,
        reason: reason.to_string(),
    });
    warn!(a = %a, b = %b, reason, "pairing authorization revoked");
    Ok(())
}

// ── Hash-based pairing check ─────────────────────────────────────────────────

/// Can these two component hashes pair right now? Consults component status,
/// the authorization record, and the current relationship trust score.
pub fn verify_component_pairing_with_hashes(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    hash_a: &ComponentId,
    hash_b: &ComponentId,
    now: TimestampNs,
) -> Result<PairingCheck, LedgerError> {
    let check = pairing_check(state, hash_a, hash_b, now)?;
    events.push(Event::ComponentPairingVerifiedWithHashes {
        component_a: *hash_a,
        component_b: *hash_b,
        can_pair: check.can_pair,
        trust_score: check.trust_score,
    });
    events.push(Event::RelationshipTrustCalculated {
        component_a: *hash_a,
        component_b: *hash_b,
        score: check.trust_score,
        no_witnesses: check.no_witnesses,
    });
    Ok(check)
}

fn pairing_check(
    state: &Overlay<'_>,
    hash_a: &ComponentId,
    hash_b: &ComponentId,
    now: TimestampNs,
) -> Result<PairingCheck, LedgerError> {
    let refused = |reason: &str, trust: f64, no_witnesses: bool| PairingCheck {
        can_pair: false,
        reason: reason.to_string(),
        trust_score: trust,
        no_witnesses,
    };

    for hash in [hash_a, hash_b] {
        match get_component(state, hash)? {
            None => return Ok(refused("component not found", 0.0, true)),
            Some(c) if c.status != ComponentStatus::Active => {
                return Ok(refused("component not active", 0.0, true))
            }
            Some(_) => {}
        }
    }

    let auth = match get_authorization(state, hash_a, hash_b)? {
        None => return Ok(refused("no pairing authorization", 0.0, true)),
        Some(a) => a,
    };
    if auth.status != AuthorizationStatus::Active {
        return Ok(refused("authorization revoked", 0.0, true));
    }
    if now >= auth.expires_at {
        return Ok(refused("authorization expired", 0.0, true));
    }

    let trust = web4_trust::calculate_relationship_trust(state, hash_a, hash_b, "pairing")?;
    if trust.score < auth.effective_requirement() {
        return Ok(PairingCheck {
            can_pair: false,
            reason: format!(
                "trust score {:.2} below requirement {:.2}",
                trust.score,
                auth.effective_requirement()
            ),
            trust_score: trust.score,
            no_witnesses: trust.no_witnesses,
        });
    }

    Ok(PairingCheck {
        can_pair: true,
        reason: String::new(),
        trust_score: trust.score,
        no_witnesses: trust.no_witnesses,
    })
}

// ── Revocation events ────────────────────────────────────────────────────────

/// Apply an anonymous revocation event. `Individual` targets one component
/// hash; `Class` and `Manufacturer` sweep every component whose category or
/// manufacturer hash matches the target.
pub fn create_anonymous_revocation_event(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    target_hash: &Hash32,
    revocation_type: RevocationType,
    urgency_level: &str,
    reason_category: &str,
    initiator: &str,
    now: TimestampNs,
) -> Result<u64, LedgerError> {
    let mut revoked = 0u64;
    match revocation_type {
        RevocationType::Individual => {
            let component = get_component(state, target_hash)?
                .ok_or(LedgerError::ComponentNotFound(*target_hash))?;
            revoke_one(state, component, initiator, reason_category, now)?;
            revoked = 1;
        }
        RevocationType::Class | RevocationType::Manufacturer => {
            let all: Vec<(Vec<u8>, Component)> =
                state.scan_prefix_as(keys::COMPONENT.as_bytes())?;
            for (_, component) in all {
                let matches = match revocation_type {
                    RevocationType::Class => component.category_hash == *target_hash,
                    _ => component.manufacturer_hash == *target_hash,
                };
                if matches && component.status == ComponentStatus::Active {
                    revoke_one(state, component, initiator, reason_category, now)?;
                    revoked += 1;
                }
            }
        }
    }

    events.push(Event::AnonymousRevocationCreated {
        target_hash: *target_hash,
        revocation_type: format!("{revocation_type:?}").to_uppercase(),
        urgency_level: urgency_level.to_string(),
    });
    warn!(target = %target_hash, ?revocation_type, revoked, "revocation event applied");
    Ok(revoked)
}

fn revoke_one(
    state: &mut Overlay<'_>,
    mut component: Component,
    initiator: &str,
    reason_category: &str,
    now: TimestampNs,
) -> Result<(), LedgerError> {
    component.status = ComponentStatus::Revoked;
    let hash = component.component_id;
    state.put(keys::component(&hash), &component)?;
    append_verification(
        state,
        ComponentVerification {
            component_hash: hash,
            verifier: initiator.to_string(),
            result: "revoked".into(),
            verified_at: now,
            notes: reason_category.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_store::Store;

    const NOW: TimestampNs = 1_700_000_000_000_000_000;

    fn setup<'a>(store: &'a Store) -> (Overlay<'a>, Vec<Event>) {
        (Overlay::new(store), Vec::new())
    }

    fn register<'a>(
        state: &mut Overlay<'a>,
        events: &mut Vec<Event>,
        real_id: &str,
    ) -> Component {
        register_anonymous_component(
            state,
            events,
            real_id,
            "ACME",
            "battery_pack",
            "anchor-1",
            NOW,
        )
        .unwrap()
    }

    #[test]
    fn registration_stores_only_hashes() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let component = register(&mut state, &mut events, "batt-001");

        assert_eq!(component.component_id, anonymize("batt-001"));
        assert_eq!(component.manufacturer_hash, anonymize("ACME"));
        assert_eq!(component.category_hash, anonymize("battery_pack"));
        assert_eq!(component.status, ComponentStatus::Active);

        // The raw identifiers do not appear in the stored bytes.
        let raw = state
            .get_raw(&keys::component(&component.component_id))
            .unwrap()
            .unwrap();
        let stored = String::from_utf8_lossy(&raw);
        assert!(!stored.contains("batt-001"));
        assert!(!stored.contains("ACME"));
        assert!(!stored.contains("battery_pack"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        register(&mut state, &mut events, "batt-001");
        let err = register_anonymous_component(
            &mut state, &mut events, "batt-001", "ACME", "battery_pack", "anchor-1", NOW,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateComponent(_)));
    }

    #[test]
    fn verify_inactive_component_fails_with_event() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let component = register(&mut state, &mut events, "batt-001");
        create_anonymous_revocation_event(
            &mut state,
            &mut events,
            &component.component_id,
            RevocationType::Individual,
            "high",
            "compromised",
            "anchor-1",
            NOW,
        )
        .unwrap();

        let (ok, metadata) =
            verify_component(&mut state, &mut events, "verifier-1", &component.component_id, NOW)
                .unwrap();
        assert!(!ok);
        assert!(metadata.is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            Event::ComponentVerified { status, .. } if status == "failed_inactive"
        )));
    }

    #[test]
    fn verify_active_component_updates_timestamp() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let component = register(&mut state, &mut events, "batt-001");
        let (ok, metadata) =
            verify_component(&mut state, &mut events, "verifier-1", &component.component_id, NOW)
                .unwrap();
        assert!(ok);
        assert!(metadata.contains(&component.category_hash.to_hex()));
        let stored = get_component(&state, &component.component_id).unwrap().unwrap();
        assert_eq!(stored.last_verified_at, Some(NOW));
        let log: Vec<ComponentVerification> = state
            .get(&keys::verification(&component.component_id))
            .unwrap()
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn pairing_check_requires_authorization_and_trust() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;

        let check =
            verify_component_pairing_with_hashes(&mut state, &mut events, &a, &b, NOW).unwrap();
        assert!(!check.can_pair);
        assert_eq!(check.reason, "no pairing authorization");

        create_pairing_authorization(
            &mut state,
            &mut events,
            a,
            b,
            anonymize("default_rules"),
            0.5,
            AuthorizationLevel::Basic,
            None,
            NOW,
        )
        .unwrap();

        // Default trust is 0.5 with the no_witnesses flag recorded.
        let check =
            verify_component_pairing_with_hashes(&mut state, &mut events, &a, &b, NOW).unwrap();
        assert!(check.can_pair, "basic floor is met by the 0.5 default");
        assert_eq!(check.trust_score, 0.5);
        assert!(check.no_witnesses);
    }

    #[test]
    fn expired_authorization_blocks_pairing() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        create_pairing_authorization(
            &mut state,
            &mut events,
            a,
            b,
            anonymize("default_rules"),
            0.5,
            AuthorizationLevel::Basic,
            Some(NOW + 10),
            NOW,
        )
        .unwrap();
        let check =
            verify_component_pairing_with_hashes(&mut state, &mut events, &a, &b, NOW + 10)
                .unwrap();
        assert!(!check.can_pair);
        assert_eq!(check.reason, "authorization expired");
    }

    #[test]
    fn enhanced_authorization_needs_witnessed_trust() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        // Default trust 0.5 cannot clear the enhanced floor (0.70).
        let err = create_pairing_authorization(
            &mut state,
            &mut events,
            a,
            b,
            anonymize("default_rules"),
            0.7,
            AuthorizationLevel::Enhanced,
            None,
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::TrustScoreInsufficient { .. }));
    }

    #[test]
    fn pairing_gate_is_monotone_in_trust() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        create_pairing_authorization(
            &mut state, &mut events, a, b,
            anonymize("default_rules"), 0.5, AuthorizationLevel::Basic, None, NOW,
        )
        .unwrap();

        let tensor = web4_trust::create_relationship_tensor(
            &mut state,
            &mut events,
            None,
            a,
            b,
            web4_core::transaction::TensorType::T3,
            "pairing",
            NOW,
        )
        .unwrap();

        // Push the score down below the floor, then raise it step by step:
        // once the gate opens it never closes again at a higher score.
        web4_trust::update_tensor_score(&mut state, &mut events, tensor.tensor_id, 0.0, "w1", NOW)
            .unwrap();
        let mut opened = false;
        for round in 0..6 {
            let check =
                verify_component_pairing_with_hashes(&mut state, &mut events, &a, &b, NOW)
                    .unwrap();
            if opened {
                assert!(check.can_pair, "gate closed after opening at round {round}");
            }
            opened |= check.can_pair;
            web4_trust::update_tensor_score(
                &mut state, &mut events, tensor.tensor_id, 1.0,
                &format!("w{round}"), NOW,
            )
            .unwrap();
        }
        let final_check =
            verify_component_pairing_with_hashes(&mut state, &mut events, &a, &b, NOW).unwrap();
        assert!(opened && final_check.can_pair);
    }

    #[test]
    fn revocation_is_final() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        create_pairing_authorization(
            &mut state, &mut events, a, b,
            anonymize("default_rules"), 0.5, AuthorizationLevel::Basic, None, NOW,
        )
        .unwrap();
        revoke_authorization(&mut state, &mut events, a, b, "policy", NOW).unwrap();

        // No update, no re-revoke, no recreate.
        assert!(matches!(
            update_authorization(&mut state, &mut events, a, b, Some(0.6), None, None, NOW),
            Err(LedgerError::AuthorizationRevoked)
        ));
        assert!(matches!(
            revoke_authorization(&mut state, &mut events, a, b, "again", NOW),
            Err(LedgerError::AuthorizationRevoked)
        ));
        assert!(matches!(
            create_pairing_authorization(
                &mut state, &mut events, a, b,
                anonymize("default_rules"), 0.5, AuthorizationLevel::Basic, None, NOW,
            ),
            Err(LedgerError::AuthorizationRevoked)
        ));
    }

    #[test]
    fn update_bumps_version() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        let auth = create_pairing_authorization(
            &mut state, &mut events, a, b,
            anonymize("default_rules"), 0.5, AuthorizationLevel::Basic, None, NOW,
        )
        .unwrap();
        assert_eq!(auth.version, 1);
        let auth = update_authorization(
            &mut state, &mut events, b, a, Some(0.55), None, None, NOW + 1,
        )
        .unwrap();
        assert_eq!(auth.version, 2);
        assert_eq!(auth.updated_at, NOW + 1);
        assert!((auth.trust_score_requirement - 0.55).abs() < 1e-9);
    }

    #[test]
    fn manufacturer_revocation_sweeps_matching_components() {
        let store = Store::temporary().unwrap();
        let (mut state, mut events) = setup(&store);
        let a = register(&mut state, &mut events, "batt-001").component_id;
        let b = register(&mut state, &mut events, "motor-001").component_id;
        let other = register_anonymous_component(
            &mut state, &mut events, "cell-009", "OTHERCORP", "battery_pack", "anchor-1", NOW,
        )
        .unwrap()
        .component_id;

        let revoked = create_anonymous_revocation_event(
            &mut state,
            &mut events,
            &anonymize("ACME"),
            RevocationType::Manufacturer,
            "critical",
            "recall",
            "anchor-1",
            NOW,
        )
        .unwrap();
        assert_eq!(revoked, 2);
        assert_eq!(
            get_component(&state, &a).unwrap().unwrap().status,
            ComponentStatus::Revoked
        );
        assert_eq!(
            get_component(&state, &b).unwrap().unwrap().status,
            ComponentStatus::Revoked
        );
        assert_eq!(
            get_component(&state, &other).unwrap().unwrap().status,
            ComponentStatus::Active
        );
    }
}
