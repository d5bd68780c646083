//! Society and role records: the governance context a chain belongs to.

use serde::{Deserialize, Serialize};
use tracing::info;

use web4_core::error::LedgerError;
use web4_core::transaction::{RoleType, R6};
use web4_core::types::{Hash32, TimestampNs};
use web4_store::{keys, Overlay};

// ── Records ──────────────────────────────────────────────────────────────────

/// One enacted society law.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SocietyLaw {
    pub law_id: String,
    pub text_hash: Hash32,
    pub supporters: Vec<String>,
    pub total_citizens: u64,
    pub economic_change: bool,
    pub enacted_at: TimestampNs,
}

/// Governance context owning a chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Society {
    pub society_id: String,
    pub name: String,
    pub law_oracle_id: String,
    pub constitution_hash: Option<Hash32>,
    pub citizens: Vec<String>,
    /// Entities whose absence from a law's supporters vetoes it.
    pub veto_entities: Vec<String>,
    pub laws: Vec<SocietyLaw>,
    pub created_at: TimestampNs,
}

/// A granted society role, keyed by the holder's identity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoleRecord {
    pub role_id: String,
    pub role_type: RoleType,
    pub holder: String,
    pub society_id: String,
    pub granted_at: TimestampNs,
    pub r6: R6,
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn get_society(
    state: &Overlay<'_>,
    society_id: &str,
) -> Result<Option<Society>, LedgerError> {
    state.get(&keys::society(society_id))
}

pub fn get_role(state: &Overlay<'_>, holder: &str) -> Result<Option<RoleRecord>, LedgerError> {
    state.get(&keys::role(holder))
}

pub fn create_society(
    state: &mut Overlay<'_>,
    society_id: &str,
    name: &str,
    law_oracle_id: &str,
    constitution_hash: Option<Hash32>,
    creator: &str,
    now: TimestampNs,
) -> Result<Society, LedgerError> {
    if society_id.is_empty() {
        return Err(LedgerError::MissingField("society_id"));
    }
    if state.has(&keys::society(society_id))? {
        return Err(LedgerError::DuplicateSociety(society_id.to_string()));
    }
    let society = Society {
        society_id: society_id.to_string(),
        name: name.to_string(),
        law_oracle_id: law_oracle_id.to_string(),
        constitution_hash,
        citizens: vec![creator.to_string()],
        veto_entities: Vec::new(),
        laws: Vec::new(),
        created_at: now,
    };
    state.put(keys::society(society_id), &society)?;
    info!(society_id, "society created");
    Ok(society)
}

pub fn join_society(
    state: &mut Overlay<'_>,
    society_id: &str,
    member: &str,
) -> Result<Society, LedgerError> {
    let mut society = get_society(state, society_id)?
        .ok_or_else(|| LedgerError::SocietyNotFound(society_id.to_string()))?;
    if !society.citizens.iter().any(|c| c == member) {
        society.citizens.push(member.to_string());
        state.put(keys::society(society_id), &society)?;
    }
    Ok(society)
}

pub fn leave_society(
    state: &mut Overlay<'_>,
    society_id: &str,
    member: &str,
) -> Result<Society, LedgerError> {
    let mut society = get_society(state, society_id)?
        .ok_or_else(|| LedgerError::SocietyNotFound(society_id.to_string()))?;
    let before = society.citizens.len();
    society.citizens.retain(|c| c != member);
    if society.citizens.len() == before {
        return Err(LedgerError::NotACitizen(society_id.to_string()));
    }
    state.put(keys::society(society_id), &society)?;
    Ok(society)
}

/// Record an enacted law. Quorum and veto rules are enforced by the law
/// oracle before this keeper runs.
pub fn enact_law(
    state: &mut Overlay<'_>,
    society_id: &str,
    law_id: &str,
    text_hash: Hash32,
    supporters: Vec<String>,
    economic_change: bool,
    now: TimestampNs,
) -> Result<Society, LedgerError> {
    let mut society = get_society(state, society_id)?
        .ok_or_else(|| LedgerError::SocietyNotFound(society_id.to_string()))?;
    society.laws.push(SocietyLaw {
        law_id: law_id.to_string(),
        text_hash,
        total_citizens: society.citizens.len() as u64,
        supporters,
        economic_change,
        enacted_at: now,
    });
    state.put(keys::society(society_id), &society)?;
    info!(society_id, law_id, "society law enacted");
    Ok(society)
}

/// Grant a role to a holder. One role per holder identity.
pub fn grant_role(
    state: &mut Overlay<'_>,
    role_type: RoleType,
    holder: &str,
    society_id: &str,
    r6: R6,
    now: TimestampNs,
) -> Result<RoleRecord, LedgerError> {
    if holder.is_empty() {
        return Err(LedgerError::MissingField("holder"));
    }
    let record = RoleRecord {
        role_id: format!("{}:{}", role_type.as_str(), holder),
        role_type,
        holder: holder.to_string(),
        society_id: society_id.to_string(),
        granted_at: now,
        r6,
    };
    state.put(keys::role(holder), &record)?;
    info!(holder, role = role_type.as_str(), "role granted");
    Ok(record)
}

/// Does any witness in the list act for a holder of the given role?
pub fn witness_holds_role(
    state: &Overlay<'_>,
    witnesses: &[web4_core::transaction::Witness],
    role_type: RoleType,
) -> Result<bool, LedgerError> {
    for witness in witnesses {
        if let Some(role) = get_role(state, &witness.lct_id.to_hex())? {
            if role.role_type == role_type {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_store::Store;

    const NOW: TimestampNs = 1_700_000_000_000_000_000;

    #[test]
    fn society_membership_lifecycle() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        create_society(&mut state, "society:test", "Test", "oracle:1", None, "founder", NOW)
            .unwrap();
        assert!(matches!(
            create_society(&mut state, "society:test", "Again", "oracle:1", None, "x", NOW),
            Err(LedgerError::DuplicateSociety(_))
        ));

        let s = join_society(&mut state, "society:test", "member-1").unwrap();
        assert_eq!(s.citizens.len(), 2);
        // Joining twice is a no-op.
        let s = join_society(&mut state, "society:test", "member-1").unwrap();
        assert_eq!(s.citizens.len(), 2);

        let s = leave_society(&mut state, "society:test", "member-1").unwrap();
        assert_eq!(s.citizens.len(), 1);
        assert!(matches!(
            leave_society(&mut state, "society:test", "member-1"),
            Err(LedgerError::NotACitizen(_))
        ));
    }

    #[test]
    fn roles_resolve_from_witness_lists() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let holder = Hash32::from_bytes([7u8; 32]).to_hex();
        grant_role(
            &mut state,
            RoleType::Orchestrator,
            &holder,
            "society:test",
            R6::default(),
            NOW,
        )
        .unwrap();

        let witness = web4_core::transaction::Witness {
            lct_id: Hash32::from_bytes([7u8; 32]),
            signature: web4_core::types::Signature64::ZERO,
            timestamp_ns: NOW,
            confidence: 1.0,
        };
        assert!(witness_holds_role(&state, &[witness.clone()], RoleType::Orchestrator).unwrap());
        assert!(!witness_holds_role(&state, &[witness], RoleType::Queen).unwrap());
    }
}
