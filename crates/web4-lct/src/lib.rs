//! LCT keeper: lifecycle state machine, split-key mediated pairing,
//! access validation, and integrity checks.

pub mod manager;
pub mod pairing;
pub mod records;

pub use manager::{
    audit_canonical_order, create_lct_relationship, encrypt_lct_message, get_lct, require_lct,
    stored_key_references, terminate_lct_relationship, update_lct_status, validate_lct_access,
    validate_lct_cryptographic_integrity, LctCreation,
};
pub use pairing::{
    complete_lct_mediated_pairing, expire_challenge, initiate_lct_mediated_pairing,
    PairingCompletion, PairingInit,
};
pub use records::{
    AccessDecision, AccessLevel, ChallengeStatus, LinkedContextToken, PairingChallenge,
    PairingStatus, SplitKeyRecord, SplitKeyStatus,
};
